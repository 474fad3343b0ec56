use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::error::IoError;
use crate::core::models::pair::PairError;
use crate::core::models::structure::StructureError;
use crate::core::scoring::ScoreTableError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid pipeline configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("Pair score table error: {0}")]
    ScoreTable(#[from] ScoreTableError),

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Invalid base pair: {0}")]
    Pair(#[from] PairError),

    #[error("Selection vector has length {actual}, but the problem has {expected} candidates")]
    SelectionLength { expected: usize, actual: usize },

    #[error("Invalid solver sample: {0}")]
    InvalidSample(String),

    #[error("Solver returned no samples")]
    EmptySampleSet,

    #[error("QUBO solver failed: {0}")]
    Solver(String),

    #[error("Invalid QUBO artifact: {0}")]
    Artifact(String),

    #[error("Failed to (de)serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Folding engine failed: {0}")]
    Folding(String),

    #[error("'{program}' did not finish within {seconds:.1} s and was killed")]
    FoldingTimedOut { program: String, seconds: f64 },
}
