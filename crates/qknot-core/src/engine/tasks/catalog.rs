use crate::core::models::pair::BasePair;
use crate::core::models::sequence::Sequence;
use crate::engine::config::CatalogConfig;
use tracing::{debug, instrument};

/// Enumerates every canonical pair `(i, j)` with `j - i > min_loop_len`,
/// ordered by ascending `i`, then ascending `j`.
#[instrument(skip_all, name = "catalog_task", fields(len = sequence.len()))]
pub fn run(sequence: &Sequence, config: &CatalogConfig) -> Vec<BasePair> {
    let bases = sequence.bases();
    let n = bases.len();
    let mut candidates = Vec::new();

    for i in 1..=n {
        let first_j = i + config.min_loop_len + 1;
        for j in first_j..=n {
            if bases[i - 1].pairs_with(bases[j - 1]) {
                candidates.push(BasePair::ordered(i, j));
            }
        }
    }

    debug!(count = candidates.len(), "Enumerated candidate pairs.");
    candidates
}
