use super::filter::ScoredPair;
use crate::core::models::pair::BasePair;
use crate::engine::config::InteractionConfig;
use crate::engine::progress::{Progress, ProgressReporter};
use nalgebra::DMatrix;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Coupling {
    Conflict,
    Stack,
}

/// Counts of non-zero off-diagonal couplings, each unordered pair counted once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InteractionSummary {
    pub conflicts: usize,
    pub stacks: usize,
}

fn coupling(a: &BasePair, b: &BasePair) -> Option<Coupling> {
    if a.shares_endpoint(b) {
        Some(Coupling::Conflict)
    } else if a.stacks_on(b) || b.stacks_on(a) {
        Some(Coupling::Stack)
    } else {
        None
    }
}

/// Builds the symmetric QUBO matrix for the filtered candidates.
///
/// The diagonal holds each pair's score. Two candidates sharing a position are
/// coupled by the conflict penalty; two candidates forming one helix step by
/// the stacking bonus, whichever of the two comes first in the list.
///
/// One task step is reported per matrix row.
#[instrument(skip_all, name = "interaction_task", fields(n = candidates.len()))]
pub fn run(
    candidates: &[ScoredPair],
    config: &InteractionConfig,
    reporter: &ProgressReporter,
) -> (DMatrix<f64>, InteractionSummary) {
    let n = candidates.len();
    let rows = 0..n;

    if n > 0 {
        reporter.report(Progress::TaskStart {
            total_steps: n as u64,
        });
    }

    #[cfg(not(feature = "parallel"))]
    let iterator = rows;

    #[cfg(feature = "parallel")]
    let iterator = rows.into_par_iter();

    let couplings: Vec<Vec<(usize, Coupling)>> = iterator
        .map(|a| {
            let row = ((a + 1)..n)
                .filter_map(|b| {
                    coupling(&candidates[a].pair, &candidates[b].pair).map(|c| (b, c))
                })
                .collect();
            reporter.report(Progress::TaskIncrement);
            row
        })
        .collect();

    if n > 0 {
        reporter.report(Progress::TaskFinish);
    }

    let mut matrix = DMatrix::zeros(n, n);
    let mut summary = InteractionSummary::default();
    for (a, candidate) in candidates.iter().enumerate() {
        matrix[(a, a)] = candidate.score;
    }
    for (a, row) in couplings.into_iter().enumerate() {
        for (b, kind) in row {
            let weight = match kind {
                Coupling::Conflict => {
                    summary.conflicts += 1;
                    config.conflict_penalty
                }
                Coupling::Stack => {
                    summary.stacks += 1;
                    config.stacking_bonus
                }
            };
            matrix[(a, b)] = weight;
            matrix[(b, a)] = weight;
        }
    }

    debug!(
        conflicts = summary.conflicts,
        stacks = summary.stacks,
        "Built interaction matrix."
    );
    (matrix, summary)
}
