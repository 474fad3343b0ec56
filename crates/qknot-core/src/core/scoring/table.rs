use super::defaults::{DEFAULT_FALLBACK_SCORE, DEFAULT_PAIR_SCORES};
use crate::core::models::pair::BasePair;
use crate::core::models::sequence::{Nucleotide, Sequence};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreTableError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid pair key '{0}': expected two nucleotide symbols such as 'GC'")]
    InvalidKey(String),
    #[error("Score for pair '{key}' is not a finite number")]
    NonFinite { key: String },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScoreTable {
    fallback: Option<f64>,
    pairs: HashMap<String, f64>,
}

/// Lookup table from ordered base identities to an energetic pair score.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScoreTable {
    scores: HashMap<(Nucleotide, Nucleotide), f64>,
    fallback: f64,
}

impl Default for PairScoreTable {
    fn default() -> Self {
        let scores = DEFAULT_PAIR_SCORES
            .entries()
            .filter_map(|(key, &score)| parse_key(key).ok().map(|bases| (bases, score)))
            .collect();
        Self {
            scores,
            fallback: DEFAULT_FALLBACK_SCORE,
        }
    }
}

fn parse_key(key: &str) -> Result<(Nucleotide, Nucleotide), ScoreTableError> {
    let mut chars = key.trim().chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(a), Some(b), None) => {
            let a = Nucleotide::try_from(a).map_err(|_| ScoreTableError::InvalidKey(key.into()))?;
            let b = Nucleotide::try_from(b).map_err(|_| ScoreTableError::InvalidKey(key.into()))?;
            Ok((a, b))
        }
        _ => Err(ScoreTableError::InvalidKey(key.into())),
    }
}

impl PairScoreTable {
    pub fn new(scores: HashMap<(Nucleotide, Nucleotide), f64>, fallback: f64) -> Self {
        Self { scores, fallback }
    }

    /// Loads a table from TOML of the form
    ///
    /// ```toml
    /// fallback = -0.5
    ///
    /// [pairs]
    /// GC = -2.0
    /// AU = -1.5
    /// ```
    ///
    /// The listed pairs replace the built-in table entirely; `fallback`
    /// defaults to the built-in value when omitted.
    pub fn load(path: &Path) -> Result<Self, ScoreTableError> {
        let content = std::fs::read_to_string(path).map_err(|e| ScoreTableError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawScoreTable = toml::from_str(&content).map_err(|e| ScoreTableError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawScoreTable) -> Result<Self, ScoreTableError> {
        let mut scores = HashMap::with_capacity(raw.pairs.len());
        for (key, score) in raw.pairs {
            if !score.is_finite() {
                return Err(ScoreTableError::NonFinite { key });
            }
            scores.insert(parse_key(&key)?, score);
        }
        let fallback = raw.fallback.unwrap_or(DEFAULT_FALLBACK_SCORE);
        if !fallback.is_finite() {
            return Err(ScoreTableError::NonFinite {
                key: "fallback".into(),
            });
        }
        Ok(Self { scores, fallback })
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    /// Score of the ordered base tuple, or the fallback for pairs not in the table.
    #[inline]
    pub fn score(&self, five_prime: Nucleotide, three_prime: Nucleotide) -> f64 {
        self.scores
            .get(&(five_prime, three_prime))
            .copied()
            .unwrap_or(self.fallback)
    }

    /// Score of a candidate pair within `sequence`. Positions outside the
    /// sequence are scored like any other non-canonical pair.
    pub fn score_pair(&self, pair: &BasePair, sequence: &Sequence) -> f64 {
        match (sequence.base_at(pair.i()), sequence.base_at(pair.j())) {
            (Some(a), Some(b)) => self.score(a, b),
            _ => self.fallback,
        }
    }

    /// Largest absolute score the table can assign, fallback included.
    pub fn max_magnitude(&self) -> f64 {
        self.scores
            .values()
            .map(|s| s.abs())
            .fold(self.fallback.abs(), f64::max)
    }
}
