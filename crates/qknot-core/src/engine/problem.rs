use super::error::EngineError;
use crate::core::io::error::IoError;
use crate::core::models::pair::BasePair;
use crate::core::models::sequence::Sequence;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// One non-zero upper-triangular entry of a QUBO matrix (`i <= j`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuboTerm {
    pub i: usize,
    pub j: usize,
    pub weight: f64,
}

/// A QUBO instance over candidate base pairs.
///
/// Variable `k` stands for `candidates[k]`; the matrix is symmetric with the
/// pair score on the diagonal and pairwise interactions off it. The sequence
/// travels with the problem so that a saved artifact can be solved and
/// decoded without re-running the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuboArtifact", into = "QuboArtifact")]
pub struct QuboProblem {
    sequence: Sequence,
    candidates: Vec<BasePair>,
    matrix: DMatrix<f64>,
}

impl QuboProblem {
    pub fn new(
        sequence: Sequence,
        candidates: Vec<BasePair>,
        matrix: DMatrix<f64>,
    ) -> Result<Self, EngineError> {
        let n = candidates.len();
        if matrix.nrows() != n || matrix.ncols() != n {
            return Err(EngineError::Artifact(format!(
                "matrix is {}x{} but there are {} candidates",
                matrix.nrows(),
                matrix.ncols(),
                n
            )));
        }
        for a in 0..n {
            for b in (a + 1)..n {
                if matrix[(a, b)] != matrix[(b, a)] {
                    return Err(EngineError::Artifact(format!(
                        "matrix is not symmetric at ({}, {})",
                        a, b
                    )));
                }
            }
        }
        if let Some(pair) = candidates.iter().find(|p| p.j() > sequence.len()) {
            return Err(EngineError::Artifact(format!(
                "candidate {} lies outside the sequence of length {}",
                pair,
                sequence.len()
            )));
        }
        Ok(Self {
            sequence,
            candidates,
            matrix,
        })
    }

    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    pub fn candidates(&self) -> &[BasePair] {
        &self.candidates
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    #[inline]
    pub fn bias(&self, index: usize) -> f64 {
        self.matrix[(index, index)]
    }

    /// Non-zero entries of the upper triangle, diagonal included, in row-major order.
    pub fn sparse_terms(&self) -> Vec<QuboTerm> {
        let n = self.len();
        let mut terms = Vec::new();
        for i in 0..n {
            for j in i..n {
                let weight = self.matrix[(i, j)];
                if weight != 0.0 {
                    terms.push(QuboTerm { i, j, weight });
                }
            }
        }
        terms
    }

    /// `sum(Q_kk x_k) + sum_{a<b}(Q_ab x_a x_b)` for a selection vector.
    pub fn energy(&self, selection: &[bool]) -> Result<f64, EngineError> {
        let n = self.len();
        if selection.len() != n {
            return Err(EngineError::SelectionLength {
                expected: n,
                actual: selection.len(),
            });
        }
        let active: Vec<usize> = (0..n).filter(|&k| selection[k]).collect();
        let mut energy = 0.0;
        for (pos, &a) in active.iter().enumerate() {
            energy += self.matrix[(a, a)];
            for &b in &active[pos + 1..] {
                energy += self.matrix[(a, b)];
            }
        }
        Ok(energy)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), EngineError> {
        let file = File::create(path).map_err(IoError::from)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(IoError::from)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path).map_err(IoError::from)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// On-disk form of a [`QuboProblem`]: the dense matrix is stored sparsely.
#[derive(Serialize, Deserialize)]
struct QuboArtifact {
    sequence: Sequence,
    candidates: Vec<BasePair>,
    terms: Vec<QuboTerm>,
}

impl From<QuboProblem> for QuboArtifact {
    fn from(problem: QuboProblem) -> Self {
        let terms = problem.sparse_terms();
        Self {
            sequence: problem.sequence,
            candidates: problem.candidates,
            terms,
        }
    }
}

impl TryFrom<QuboArtifact> for QuboProblem {
    type Error = EngineError;

    fn try_from(artifact: QuboArtifact) -> Result<Self, Self::Error> {
        let n = artifact.candidates.len();
        let mut matrix = DMatrix::zeros(n, n);
        let mut seen = HashSet::with_capacity(artifact.terms.len());
        for term in &artifact.terms {
            if term.i > term.j || term.j >= n {
                return Err(EngineError::Artifact(format!(
                    "term ({}, {}) is not in the upper triangle of a {}x{} matrix",
                    term.i, term.j, n, n
                )));
            }
            if !seen.insert((term.i, term.j)) {
                return Err(EngineError::Artifact(format!(
                    "term ({}, {}) appears more than once",
                    term.i, term.j
                )));
            }
            if !term.weight.is_finite() {
                return Err(EngineError::Artifact(format!(
                    "term ({}, {}) has a non-finite weight",
                    term.i, term.j
                )));
            }
            matrix[(term.i, term.j)] = term.weight;
            matrix[(term.j, term.i)] = term.weight;
        }
        QuboProblem::new(artifact.sequence, artifact.candidates, matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(i: usize, j: usize) -> BasePair {
        BasePair::new(i, j).unwrap()
    }

    fn stacked_problem() -> QuboProblem {
        // (1,8) stacks on (2,7); (1,6) shares position 1 with (1,8).
        let candidates = vec![pair(1, 8), pair(2, 7), pair(1, 6)];
        let matrix = DMatrix::from_row_slice(
            3,
            3,
            &[
                -2.0, -1.5, 5.0, //
                -1.5, -2.0, 0.0, //
                5.0, 0.0, -1.5,
            ],
        );
        QuboProblem::new("GGAAAACC".parse().unwrap(), candidates, matrix).unwrap()
    }

    #[test]
    fn energy_sums_diagonal_and_upper_triangle() {
        let problem = stacked_problem();
        assert_eq!(problem.energy(&[true, true, false]).unwrap(), -5.5);
        assert_eq!(problem.energy(&[true, false, true]).unwrap(), 1.5);
        assert_eq!(problem.energy(&[false, false, false]).unwrap(), 0.0);
    }

    #[test]
    fn energy_rejects_wrong_selection_length() {
        let result = stacked_problem().energy(&[true]);
        assert!(matches!(
            result,
            Err(EngineError::SelectionLength {
                expected: 3,
                actual: 1
            })
        ));
    }

    #[test]
    fn sparse_terms_skip_zero_entries_and_lower_triangle() {
        let terms = stacked_problem().sparse_terms();
        let keys: Vec<(usize, usize)> = terms.iter().map(|t| (t.i, t.j)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (0, 2), (1, 1), (2, 2)]);
    }

    #[test]
    fn new_rejects_asymmetric_matrix() {
        let matrix = DMatrix::from_row_slice(2, 2, &[-1.0, 5.0, 0.0, -1.0]);
        let result = QuboProblem::new(
            "GGAAAACC".parse().unwrap(),
            vec![pair(1, 8), pair(2, 7)],
            matrix,
        );
        assert!(matches!(result, Err(EngineError::Artifact(_))));
    }

    #[test]
    fn new_rejects_dimension_mismatch() {
        let result = QuboProblem::new(
            "GGAAAACC".parse().unwrap(),
            vec![pair(1, 8)],
            DMatrix::zeros(2, 2),
        );
        assert!(matches!(result, Err(EngineError::Artifact(_))));
    }

    #[test]
    fn empty_problem_is_allowed() {
        let problem =
            QuboProblem::new("GGGG".parse().unwrap(), Vec::new(), DMatrix::zeros(0, 0)).unwrap();
        assert!(problem.is_empty());
        assert!(problem.sparse_terms().is_empty());
        assert_eq!(problem.energy(&[]).unwrap(), 0.0);
    }

    #[test]
    fn json_artifact_preserves_problem() {
        let problem = stacked_problem();
        let json = serde_json::to_string(&problem).unwrap();
        assert!(json.contains("\"sequence\":\"GGAAAACC\""));
        let back: QuboProblem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, problem);
    }

    #[test]
    fn json_artifact_rejects_lower_triangle_terms() {
        let json = r#"{"sequence":"GGAAAACC","candidates":[[1,8],[2,7]],
            "terms":[{"i":1,"j":0,"weight":5.0}]}"#;
        assert!(serde_json::from_str::<QuboProblem>(json).is_err());
    }

    #[test]
    fn save_and_load_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("problem.json");
        let problem = stacked_problem();
        problem.save_json(&path).unwrap();
        assert_eq!(QuboProblem::load_json(&path).unwrap(), problem);
    }
}
