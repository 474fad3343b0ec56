use super::error::EngineError;
use super::problem::{QuboProblem, QuboTerm};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_NUM_READS: usize = 100;

/// What is handed to an external QUBO solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverRequest {
    pub num_variables: usize,
    pub num_reads: usize,
    pub terms: Vec<QuboTerm>,
}

impl SolverRequest {
    pub fn from_problem(problem: &QuboProblem, num_reads: usize) -> Self {
        Self {
            num_variables: problem.len(),
            num_reads,
            terms: problem.sparse_terms(),
        }
    }
}

/// Variable assignment of one sample.
///
/// Solvers either list every variable in order, or map variable indices to
/// values; variables absent from a map carry no terms and are read as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Assignment {
    Dense(Vec<u8>),
    Sparse(BTreeMap<String, u8>),
}

fn default_occurrences() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub assignment: Assignment,
    /// Energy as reported by the solver; informational only.
    #[serde(default)]
    pub energy: Option<f64>,
    #[serde(default = "default_occurrences")]
    pub num_occurrences: usize,
}

fn check_bit(index: usize, value: u8) -> Result<bool, EngineError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(EngineError::InvalidSample(format!(
            "variable {} has value {}, expected 0 or 1",
            index, other
        ))),
    }
}

impl Sample {
    /// Expands the assignment into a selection vector over `num_variables` candidates.
    pub fn to_selection(&self, num_variables: usize) -> Result<Vec<bool>, EngineError> {
        match &self.assignment {
            Assignment::Dense(values) => {
                if values.len() != num_variables {
                    return Err(EngineError::SelectionLength {
                        expected: num_variables,
                        actual: values.len(),
                    });
                }
                values
                    .iter()
                    .enumerate()
                    .map(|(k, &v)| check_bit(k, v))
                    .collect()
            }
            Assignment::Sparse(values) => {
                let mut selection = vec![false; num_variables];
                for (key, &v) in values {
                    let k: usize = key.trim().parse().map_err(|_| {
                        EngineError::InvalidSample(format!("variable key '{}' is not an index", key))
                    })?;
                    if k >= num_variables {
                        return Err(EngineError::InvalidSample(format!(
                            "variable index {} outside a problem with {} variables",
                            k, num_variables
                        )));
                    }
                    selection[k] = check_bit(k, v)?;
                }
                Ok(selection)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    pub samples: Vec<Sample>,
}

/// The lowest-energy sample of a set, decoded against a problem.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSample {
    pub selection: Vec<bool>,
    pub energy: f64,
}

impl SampleSet {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Ranks every sample by its energy under `problem` and returns the best.
    ///
    /// Energies are recomputed rather than trusted from the solver; ties keep
    /// the solver's order, so the result is deterministic for a given set.
    pub fn best(&self, problem: &QuboProblem) -> Result<BestSample, EngineError> {
        let mut best: Option<BestSample> = None;
        for sample in &self.samples {
            let selection = sample.to_selection(problem.len())?;
            let energy = problem.energy(&selection)?;
            if let Some(reported) = sample.energy {
                if (reported - energy).abs() > 1e-6 {
                    debug!(
                        reported,
                        computed = energy,
                        "Solver-reported energy differs from the problem energy."
                    );
                }
            }
            if best.as_ref().is_none_or(|b| energy < b.energy) {
                best = Some(BestSample { selection, energy });
            }
        }
        best.ok_or(EngineError::EmptySampleSet)
    }
}

/// A source of samples for a QUBO problem.
///
/// Implementations may call out to an annealer, a quantum sampler or a remote
/// service; the engine only ever consumes the top-ranked sample.
pub trait QuboSampler {
    fn sample(&self, request: &SolverRequest) -> Result<SampleSet, EngineError>;
}

/// A sample set computed ahead of time acts as its own sampler.
impl QuboSampler for SampleSet {
    fn sample(&self, _request: &SolverRequest) -> Result<SampleSet, EngineError> {
        Ok(self.clone())
    }
}
