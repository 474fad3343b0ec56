use crate::core::models::pair::PairSet;
use serde::Serialize;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Ratio that is defined as 0.0 when the denominator is zero.
#[inline]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub true_positives: PairSet,
    pub false_positives: PairSet,
    pub false_negatives: PairSet,
}

/// Compares a predicted pair set against a reference.
///
/// Both inputs may be ill-formed; pairs are compared as normalized unordered
/// tuples, so a position shared by several predicted pairs is simply counted
/// once per pair.
pub fn compare(predicted: &PairSet, reference: &PairSet) -> Comparison {
    Comparison {
        true_positives: predicted.intersection(reference),
        false_positives: predicted.difference(reference),
        false_negatives: reference.difference(predicted),
    }
}

#[derive(Debug, Serialize)]
struct PairRow {
    class: &'static str,
    i: usize,
    j: usize,
}

impl Comparison {
    pub fn precision(&self) -> f64 {
        let tp = self.true_positives.len();
        ratio(tp, tp + self.false_positives.len())
    }

    pub fn recall(&self) -> f64 {
        let tp = self.true_positives.len();
        ratio(tp, tp + self.false_negatives.len())
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            true_positives: self.true_positives.len(),
            false_positives: self.false_positives.len(),
            false_negatives: self.false_negatives.len(),
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }

    /// Writes one CSV row per classified pair (`class,i,j`).
    pub fn write_csv(&self, writer: impl Write) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let classes = [
            ("tp", &self.true_positives),
            ("fp", &self.false_positives),
            ("fn", &self.false_negatives),
        ];
        for (class, pairs) in classes {
            for pair in pairs {
                csv_writer.serialize(PairRow {
                    class,
                    i: pair.i(),
                    j: pair.j(),
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.metrics();
        writeln!(f, "True Positives:  {}", m.true_positives)?;
        writeln!(f, "False Positives: {}", m.false_positives)?;
        writeln!(f, "False Negatives: {}", m.false_negatives)?;
        writeln!(f, "Precision: {:.3}", m.precision)?;
        writeln!(f, "Recall:    {:.3}", m.recall)?;
        write!(f, "F1 Score:  {:.3}", m.f1)?;

        if !self.false_negatives.is_empty() {
            write!(f, "\n\nFalse Negatives (missed base pairs):")?;
            for pair in &self.false_negatives {
                write!(f, "\n  Missed true pair: {}", pair)?;
            }
        }
        if !self.false_positives.is_empty() {
            write!(f, "\n\nFalse Positives (extra predicted pairs):")?;
            for pair in &self.false_positives {
                write!(f, "\n  Incorrect predicted pair: {}", pair)?;
            }
        }
        Ok(())
    }
}
