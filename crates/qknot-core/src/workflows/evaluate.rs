use crate::core::evaluation::{Comparison, compare};
use crate::core::io::LoadedStructure;
use crate::engine::progress::{Progress, ProgressReporter, Stage};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub comparison: Comparison,
    /// Set when both inputs carry a sequence and the sequences differ.
    pub sequence_mismatch: bool,
}

/// Scores a predicted structure against a reference.
///
/// Comparison is purely pair-based; differing sequences are reported but do
/// not stop the evaluation.
#[instrument(skip_all, name = "evaluate_workflow")]
pub fn run(
    predicted: &LoadedStructure,
    reference: &LoadedStructure,
    reporter: &ProgressReporter,
) -> Evaluation {
    reporter.report(Progress::StageStart {
        stage: Stage::Evaluation,
    });

    let sequence_mismatch = match (&predicted.sequence, &reference.sequence) {
        (Some(p), Some(r)) if p != r => {
            warn!(
                "Predicted sequence (length {}) differs from reference sequence (length {}).",
                p.len(),
                r.len()
            );
            true
        }
        _ => false,
    };

    let comparison = compare(&predicted.pairs, &reference.pairs);
    let metrics = comparison.metrics();
    info!(
        "TP={} FP={} FN={} precision={:.3} recall={:.3} f1={:.3}",
        metrics.true_positives,
        metrics.false_positives,
        metrics.false_negatives,
        metrics.precision,
        metrics.recall,
        metrics.f1
    );

    reporter.report(Progress::StageFinish {
        stage: Stage::Evaluation,
    });
    Evaluation {
        comparison,
        sequence_mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::pair::PairSet;

    fn loaded(seq: Option<&str>, pairs: &[(usize, usize)]) -> LoadedStructure {
        LoadedStructure {
            sequence: seq.map(|s| s.parse().unwrap()),
            pairs: PairSet::from_pairs(pairs.iter().copied()).unwrap(),
        }
    }

    #[test]
    fn evaluation_reports_metrics() {
        let eval = run(
            &loaded(Some("GGGAAACCC"), &[(1, 9), (2, 8)]),
            &loaded(Some("GGGAAACCC"), &[(1, 9), (3, 7)]),
            &ProgressReporter::new(),
        );
        assert!(!eval.sequence_mismatch);
        assert_eq!(eval.comparison.precision(), 0.5);
        assert_eq!(eval.comparison.recall(), 0.5);
    }

    #[test]
    fn differing_sequences_are_flagged() {
        let eval = run(
            &loaded(Some("GGGAAACCC"), &[(1, 9)]),
            &loaded(Some("GGGAAACCU"), &[(1, 9)]),
            &ProgressReporter::new(),
        );
        assert!(eval.sequence_mismatch);
        assert_eq!(eval.comparison.f1(), 1.0);
    }

    #[test]
    fn pair_lists_without_sequence_are_never_flagged() {
        let eval = run(
            &loaded(None, &[(1, 9)]),
            &loaded(Some("GGGAAACCC"), &[(1, 9)]),
            &ProgressReporter::new(),
        );
        assert!(!eval.sequence_mismatch);
    }
}
