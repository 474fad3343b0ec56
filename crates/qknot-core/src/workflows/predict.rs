use crate::core::models::pair::{BasePair, PairSet};
use crate::core::models::structure::{DotBracket, StructureError};
use crate::engine::config::ExtractionConfig;
use crate::engine::error::EngineError;
use crate::engine::problem::QuboProblem;
use crate::engine::progress::{Progress, ProgressReporter, Stage};
use crate::engine::sampler::{QuboSampler, SolverRequest};
use crate::engine::tasks::extraction;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Selection vector of the top-ranked sample.
    pub selection: Vec<bool>,
    /// QUBO energy of that selection.
    pub energy: f64,
    /// Every selected candidate, in candidate order.
    pub selected: Vec<BasePair>,
    /// The pairs making up the structure; equal to `selected` unless
    /// conflict resolution is enabled.
    pub pairs: Vec<BasePair>,
    /// Positions claimed by more than one selected candidate.
    pub conflicting_positions: usize,
    /// `pairs` as dot-bracket, as long as the largest paired position.
    pub structure: DotBracket,
}

impl Prediction {
    pub fn pair_set(&self) -> PairSet {
        self.pairs.iter().copied().collect()
    }

    /// The structure padded with unpaired positions to `length`.
    pub fn structure_for_length(&self, length: usize) -> Result<DotBracket, EngineError> {
        Ok(DotBracket::render_simple(length, &self.pairs)?)
    }

    /// Like [`Prediction::structure_for_length`], but crossing pairs of a
    /// well-formed prediction are written with successive bracket families
    /// so pseudoknots survive a round trip through a dot-bracket file.
    pub fn annotated_structure(&self, length: usize) -> Result<DotBracket, EngineError> {
        let pairs = self.pair_set();
        if !pairs.is_well_formed() {
            return self.structure_for_length(length);
        }
        match DotBracket::render(length, &pairs) {
            Err(StructureError::FamiliesExhausted) => {
                warn!("Too many crossing layers for distinct brackets; writing a single family.");
                self.structure_for_length(length)
            }
            other => Ok(other?),
        }
    }
}

/// Decodes a selection vector into a predicted structure.
pub fn decode(
    problem: &QuboProblem,
    selection: Vec<bool>,
    energy: f64,
    config: &ExtractionConfig,
) -> Result<Prediction, EngineError> {
    let indices = extraction::selected_indices(problem, &selection)?;
    let selected = extraction::pairs_at(problem, &indices);
    let conflicting_positions = extraction::conflicting_positions(&selected);

    if conflicting_positions > 0 {
        warn!(
            "Selected pairs reuse {} position(s); the raw selection is not a valid structure.",
            conflicting_positions
        );
    }

    let pairs = if config.resolve_conflicts && conflicting_positions > 0 {
        let kept = extraction::resolve_conflicts(problem, &indices);
        info!(
            "Conflict resolution kept {} of {} selected pairs.",
            kept.len(),
            indices.len()
        );
        extraction::pairs_at(problem, &kept)
    } else {
        selected.clone()
    };
    let structure = extraction::to_dot_bracket(&pairs)?;

    Ok(Prediction {
        selection,
        energy,
        selected,
        pairs,
        conflicting_positions,
        structure,
    })
}

/// Samples `problem` and decodes the lowest-energy sample.
///
/// A problem without candidates predicts the empty structure without
/// consulting the sampler.
#[instrument(skip_all, name = "predict_workflow", fields(n = problem.len()))]
pub fn run(
    problem: &QuboProblem,
    sampler: &dyn QuboSampler,
    num_reads: usize,
    config: &ExtractionConfig,
    reporter: &ProgressReporter,
) -> Result<Prediction, EngineError> {
    if problem.is_empty() {
        info!("No candidate pairs; predicting the unpaired structure.");
        return decode(problem, Vec::new(), 0.0, config);
    }

    let samples = reporter.stage(Stage::Sampling, || {
        let request = SolverRequest::from_problem(problem, num_reads);
        info!(
            "Requesting {} read(s) over {} variables and {} terms.",
            request.num_reads,
            request.num_variables,
            request.terms.len()
        );
        sampler.sample(&request)
    })?;
    info!("Solver returned {} sample(s).", samples.len());

    reporter.stage(Stage::Extraction, || {
        let best = samples.best(problem)?;
        reporter.report(Progress::Message(format!(
            "Best sample energy: {:.3}",
            best.energy
        )));
        let prediction = decode(problem, best.selection, best.energy, config)?;
        info!(
            "Predicted {} base pair(s) at QUBO energy {:.3}: {}",
            prediction.pairs.len(),
            prediction.energy,
            prediction.structure
        );
        Ok(prediction)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::sequence::Sequence;
    use crate::core::scoring::PairScoreTable;
    use crate::engine::config::PipelineConfigBuilder;
    use crate::engine::sampler::{Assignment, Sample, SampleSet};
    use crate::workflows::build;
    use std::cell::Cell;

    fn gcgc_problem() -> QuboProblem {
        let config = PipelineConfigBuilder::new()
            .min_loop_len(0)
            .scoring(PairScoreTable::default())
            .filter_fraction(1.0)
            .conflict_penalty(6.0)
            .stacking_bonus(-1.5)
            .resolve_conflicts(false)
            .build()
            .unwrap();
        let seq: Sequence = "GCGC".parse().unwrap();
        build::run(&seq, &config, &ProgressReporter::new())
            .unwrap()
            .problem
    }

    fn samples(assignments: &[&[u8]]) -> SampleSet {
        SampleSet {
            samples: assignments
                .iter()
                .map(|a| Sample {
                    assignment: Assignment::Dense(a.to_vec()),
                    energy: None,
                    num_occurrences: 1,
                })
                .collect(),
        }
    }

    struct CountingSampler {
        inner: SampleSet,
        calls: Cell<usize>,
    }

    impl QuboSampler for CountingSampler {
        fn sample(&self, request: &SolverRequest) -> Result<SampleSet, EngineError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.sample(request)
        }
    }

    #[test]
    fn stacked_helix_is_predicted_from_best_sample() {
        let problem = gcgc_problem();
        let set = samples(&[&[1, 0, 0, 1], &[0, 1, 1, 0]]);
        let prediction =
            run(&problem, &set, 10, &ExtractionConfig::default(), &ProgressReporter::new()).unwrap();
        assert_eq!(prediction.structure.to_string(), "(())");
        assert_eq!(prediction.energy, -5.5);
        assert_eq!(prediction.conflicting_positions, 0);
    }

    #[test]
    fn raw_conflicting_selection_is_reported_not_repaired() {
        let problem = gcgc_problem();
        let prediction = decode(
            &problem,
            vec![true, true, false, false],
            1.0,
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(prediction.pairs.len(), 2);
        assert_eq!(prediction.conflicting_positions, 1);
        // (1,2) then (1,4): the later pair overwrites position 1.
        assert_eq!(prediction.structure.to_string(), "().)");
    }

    #[test]
    fn conflict_resolution_yields_well_formed_pairs() {
        let problem = gcgc_problem();
        let config = ExtractionConfig {
            resolve_conflicts: true,
        };
        let prediction = decode(&problem, vec![true, true, true, true], 0.0, &config).unwrap();
        assert_eq!(prediction.selected.len(), 4);
        assert!(prediction.pair_set().is_well_formed());
        assert_eq!(prediction.pairs.len(), 2);
    }

    #[test]
    fn empty_problem_skips_the_sampler() {
        let problem = QuboProblem::new(
            "GGGG".parse().unwrap(),
            Vec::new(),
            nalgebra::DMatrix::zeros(0, 0),
        )
        .unwrap();
        let sampler = CountingSampler {
            inner: SampleSet::default(),
            calls: Cell::new(0),
        };
        let prediction = run(
            &problem,
            &sampler,
            10,
            &ExtractionConfig::default(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(sampler.calls.get(), 0);
        assert!(prediction.structure.is_empty());
        assert_eq!(
            prediction.structure_for_length(4).unwrap().to_string(),
            "...."
        );
    }

    #[test]
    fn empty_sample_set_is_an_error() {
        let problem = gcgc_problem();
        let result = run(
            &problem,
            &SampleSet::default(),
            10,
            &ExtractionConfig::default(),
            &ProgressReporter::new(),
        );
        assert!(matches!(result, Err(EngineError::EmptySampleSet)));
    }

    #[test]
    fn annotated_structure_keeps_pseudoknots_distinct() {
        let candidates = vec![
            BasePair::new(1, 5).unwrap(),
            BasePair::new(3, 7).unwrap(),
        ];
        let matrix = nalgebra::DMatrix::from_diagonal_element(2, 2, -2.0);
        let problem = QuboProblem::new("GAGACUCU".parse().unwrap(), candidates, matrix).unwrap();
        let prediction = decode(
            &problem,
            vec![true, true],
            -4.0,
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(prediction.structure.to_string(), "(.(.).)");
        assert_eq!(
            prediction.annotated_structure(8).unwrap().to_string(),
            "(.[.).]."
        );
    }

    #[test]
    fn annotated_structure_of_conflicting_pairs_uses_single_family() {
        let problem = gcgc_problem();
        let prediction = decode(
            &problem,
            vec![true, true, false, false],
            1.0,
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(prediction.annotated_structure(4).unwrap().to_string(), "().)");
    }

    #[test]
    fn structure_for_length_pads_trailing_positions() {
        let problem = gcgc_problem();
        let prediction = decode(
            &problem,
            vec![true, false, false, false],
            -2.0,
            &ExtractionConfig::default(),
        )
        .unwrap();
        assert_eq!(prediction.structure.to_string(), "()");
        assert_eq!(
            prediction.structure_for_length(4).unwrap().to_string(),
            "()..",
        );
    }
}
