use crate::core::models::pair::{BasePair, PairSet};
use crate::core::models::structure::DotBracket;
use crate::engine::error::EngineError;
use crate::engine::problem::QuboProblem;
use std::collections::HashSet;
use tracing::trace;

/// Indices of the selected candidates, in candidate order.
pub fn selected_indices(
    problem: &QuboProblem,
    selection: &[bool],
) -> Result<Vec<usize>, EngineError> {
    if selection.len() != problem.len() {
        return Err(EngineError::SelectionLength {
            expected: problem.len(),
            actual: selection.len(),
        });
    }
    Ok(selection
        .iter()
        .enumerate()
        .filter_map(|(k, &on)| on.then_some(k))
        .collect())
}

pub fn pairs_at(problem: &QuboProblem, indices: &[usize]) -> Vec<BasePair> {
    indices.iter().map(|&k| problem.candidates()[k]).collect()
}

/// Greedily keeps the most favorable selected candidates so that no
/// position is used twice.
///
/// Candidates are visited by ascending bias, ties by candidate index; a
/// candidate is kept only if neither of its positions is taken yet. The
/// returned indices are in candidate order.
pub fn resolve_conflicts(problem: &QuboProblem, indices: &[usize]) -> Vec<usize> {
    let mut order = indices.to_vec();
    order.sort_by(|&a, &b| problem.bias(a).total_cmp(&problem.bias(b)).then(a.cmp(&b)));

    let mut taken = HashSet::new();
    let mut kept = Vec::with_capacity(order.len());
    for k in order {
        let pair = problem.candidates()[k];
        if taken.contains(&pair.i()) || taken.contains(&pair.j()) {
            trace!(%pair, "Dropping conflicting pair.");
            continue;
        }
        taken.insert(pair.i());
        taken.insert(pair.j());
        kept.push(k);
    }
    kept.sort_unstable();
    kept
}

/// Number of positions claimed by more than one pair.
pub fn conflicting_positions(pairs: &[BasePair]) -> usize {
    pairs.iter().copied().collect::<PairSet>().conflicts().len()
}

/// Renders pairs as a single-family dot-bracket string whose length is the
/// largest position used. Later pairs overwrite earlier ones at shared positions.
pub fn to_dot_bracket(pairs: &[BasePair]) -> Result<DotBracket, EngineError> {
    let length = pairs.iter().map(BasePair::j).max().unwrap_or(0);
    Ok(DotBracket::render_simple(length, pairs)?)
}
