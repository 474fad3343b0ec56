use super::Format;
use crate::core::models::pair::PairError;
use crate::core::models::sequence::SequenceError;
use crate::core::models::structure::StructureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {format} data on line {line}: {details}")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("Missing required {format} record: {what}")]
    MissingRecord { format: Format, what: &'static str },

    #[error("Inconsistent {format} data: {details}")]
    Inconsistency { format: Format, details: String },

    #[error("Invalid sequence: {0}")]
    Sequence(#[from] SequenceError),

    #[error("Invalid structure: {0}")]
    Structure(#[from] StructureError),

    #[error("Invalid base pair: {0}")]
    Pair(#[from] PairError),
}

impl IoError {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn inconsistency(format: Format, details: impl Into<String>) -> Self {
        Self::Inconsistency {
            format,
            details: details.into(),
        }
    }
}
