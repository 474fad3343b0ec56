use crate::core::models::pair::BasePair;
use crate::core::models::sequence::Sequence;
use crate::core::scoring::PairScoreTable;
use crate::engine::config::FilterConfig;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPair {
    pub pair: BasePair,
    pub score: f64,
}

pub fn score_candidates(
    candidates: &[BasePair],
    sequence: &Sequence,
    table: &PairScoreTable,
) -> Vec<ScoredPair> {
    candidates
        .iter()
        .map(|&pair| ScoredPair {
            pair,
            score: table.score_pair(&pair, sequence),
        })
        .collect()
}

/// Number of candidates kept out of `total` for a keep fraction.
pub fn cutoff(total: usize, fraction: f64) -> usize {
    ((total as f64 * fraction).floor() as usize).min(total)
}

/// Keeps the most favorable `floor(len * fraction)` candidates.
///
/// The sort is stable, so equal scores keep their catalog order.
#[instrument(skip_all, name = "filter_task")]
pub fn run(mut scored: Vec<ScoredPair>, config: &FilterConfig) -> Vec<ScoredPair> {
    let total = scored.len();
    scored.sort_by(|a, b| a.score.total_cmp(&b.score));
    scored.truncate(cutoff(total, config.fraction));
    debug!(kept = scored.len(), total, "Filtered candidate pairs.");
    scored
}
