use crate::core::models::sequence::Sequence;
use crate::engine::config::PipelineConfig;
use crate::engine::error::EngineError;
use crate::engine::problem::QuboProblem;
use crate::engine::progress::{Progress, ProgressReporter, Stage};
use crate::engine::tasks;
use crate::engine::tasks::interaction::InteractionSummary;
use tracing::{debug, info, instrument};

/// Number of diagonal entries echoed at debug level.
const DIAGONAL_PREVIEW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub catalog_size: usize,
    pub kept: usize,
    pub interactions: InteractionSummary,
}

#[derive(Debug, Clone)]
pub struct BuildResult {
    pub problem: QuboProblem,
    pub summary: BuildSummary,
}

#[instrument(skip_all, name = "build_workflow", fields(len = sequence.len()))]
pub fn run(
    sequence: &Sequence,
    config: &PipelineConfig,
    reporter: &ProgressReporter,
) -> Result<BuildResult, EngineError> {
    config.validate()?;

    reporter.report(Progress::StageStart {
        stage: Stage::Catalog,
    });
    let catalog = tasks::catalog::run(sequence, &config.catalog);
    let scored = tasks::filter::score_candidates(&catalog, sequence, &config.scoring);
    info!(
        "Found {} canonical candidate pairs (min loop length {}).",
        catalog.len(),
        config.catalog.min_loop_len
    );
    reporter.report(Progress::StageFinish {
        stage: Stage::Catalog,
    });

    reporter.report(Progress::StageStart {
        stage: Stage::Filtering,
    });
    let kept = tasks::filter::run(scored, &config.filter);
    info!(
        "Kept {} of {} candidates (fraction {}).",
        kept.len(),
        catalog.len(),
        config.filter.fraction
    );
    if kept.is_empty() && !catalog.is_empty() {
        info!("Filter cutoff is zero; the problem has no variables.");
    }
    reporter.report(Progress::StageFinish {
        stage: Stage::Filtering,
    });

    reporter.report(Progress::StageStart {
        stage: Stage::MatrixConstruction,
    });
    let (matrix, interactions) = tasks::interaction::run(&kept, &config.interaction, reporter);
    let preview: Vec<String> = (0..kept.len().min(DIAGONAL_PREVIEW))
        .map(|k| format!("{}={:.2}", kept[k].pair, matrix[(k, k)]))
        .collect();
    debug!(diagonal = %preview.join(", "), "QUBO diagonal preview.");

    let candidates = kept.iter().map(|c| c.pair).collect();
    let problem = QuboProblem::new(sequence.clone(), candidates, matrix)?;
    info!(
        "Built {}x{} QUBO with {} conflict and {} stacking couplings.",
        problem.len(),
        problem.len(),
        interactions.conflicts,
        interactions.stacks
    );
    reporter.report(Progress::StageFinish {
        stage: Stage::MatrixConstruction,
    });

    Ok(BuildResult {
        problem,
        summary: BuildSummary {
            catalog_size: catalog.len(),
            kept: kept.len(),
            interactions,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::pair::BasePair;
    use crate::core::scoring::PairScoreTable;
    use crate::engine::config::{ConfigError, PipelineConfigBuilder};

    fn config(min_loop_len: usize, fraction: f64) -> PipelineConfig {
        PipelineConfigBuilder::new()
            .min_loop_len(min_loop_len)
            .scoring(PairScoreTable::default())
            .filter_fraction(fraction)
            .conflict_penalty(6.0)
            .stacking_bonus(-1.5)
            .resolve_conflicts(false)
            .build()
            .unwrap()
    }

    #[test]
    fn short_sequence_builds_full_problem() {
        let seq: Sequence = "GCGC".parse().unwrap();
        let result = run(&seq, &config(0, 1.0), &ProgressReporter::new()).unwrap();
        let problem = &result.problem;

        let pairs: Vec<(usize, usize)> = problem.candidates().iter().map(|&p| p.into()).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 4), (2, 3), (3, 4)]);
        for k in 0..4 {
            assert_eq!(problem.bias(k), -2.0);
        }
        // (1,4) encloses (2,3); every other coupled couple shares a position.
        assert_eq!(problem.matrix()[(1, 2)], -1.5);
        assert_eq!(problem.matrix()[(0, 1)], 6.0);
        assert_eq!(problem.matrix()[(0, 2)], 6.0);
        assert_eq!(problem.matrix()[(0, 3)], 0.0);
        assert_eq!(problem.matrix()[(1, 3)], 6.0);
        assert_eq!(problem.matrix()[(2, 3)], 6.0);
        assert_eq!(
            result.summary,
            BuildSummary {
                catalog_size: 4,
                kept: 4,
                interactions: InteractionSummary {
                    conflicts: 4,
                    stacks: 1
                },
            }
        );
    }

    #[test]
    fn strongest_pairs_survive_filtering() {
        let seq: Sequence = "GAAAACAAAAUAAAAA".parse().unwrap();
        let result = run(&seq, &config(3, 0.5), &ProgressReporter::new()).unwrap();
        assert_eq!(result.summary.catalog_size, 9);
        assert_eq!(result.summary.kept, 4);
        assert_eq!(result.problem.candidates()[0], BasePair::new(1, 6).unwrap());
    }

    #[test]
    fn tiny_catalog_filters_to_empty_problem() {
        let seq: Sequence = "GGGAAACC".parse().unwrap();
        let result = run(&seq, &config(3, 0.15), &ProgressReporter::new()).unwrap();
        assert_eq!(result.summary.catalog_size, 6);
        assert!(result.problem.is_empty());
        assert_eq!(result.problem.matrix().nrows(), 0);
    }

    #[test]
    fn matrix_construction_reports_row_progress() {
        let events = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p: Progress| {
            events.lock().unwrap().push(p);
        }));
        let seq: Sequence = "GCGC".parse().unwrap();
        run(&seq, &config(0, 1.0), &reporter).unwrap();
        drop(reporter);

        let events = events.into_inner().unwrap();
        let increments = events
            .iter()
            .filter(|e| matches!(e, Progress::TaskIncrement))
            .count();
        assert_eq!(increments, 4);
        assert!(
            events
                .iter()
                .any(|e| matches!(e, Progress::TaskStart { total_steps: 4 }))
        );
    }

    #[test]
    fn invalid_config_is_rejected_before_building() {
        let mut bad = config(3, 0.15);
        bad.interaction.conflict_penalty = 1.0;
        let seq: Sequence = "GGGAAACCC".parse().unwrap();
        let result = run(&seq, &bad, &ProgressReporter::new());
        assert!(matches!(
            result,
            Err(EngineError::Config(ConfigError::PenaltyNotDominating { .. }))
        ));
    }
}
