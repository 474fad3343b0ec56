use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Nucleotide {
    A,
    C,
    G,
    U,
    N, // Any IUPAC ambiguity code; never forms a canonical pair
}

impl Nucleotide {
    pub fn to_char(self) -> char {
        match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::U => 'U',
            Nucleotide::N => 'N',
        }
    }

    /// Returns `true` for the six Watson-Crick and wobble pairings
    /// (A-U, U-A, G-C, C-G, G-U, U-G).
    pub fn pairs_with(self, other: Nucleotide) -> bool {
        use Nucleotide::*;
        matches!(
            (self, other),
            (A, U) | (U, A) | (G, C) | (C, G) | (G, U) | (U, G)
        )
    }
}

impl TryFrom<char> for Nucleotide {
    type Error = SequenceError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Ok(match c.to_ascii_uppercase() {
            'A' => Nucleotide::A,
            'C' => Nucleotide::C,
            'G' => Nucleotide::G,
            'U' | 'T' => Nucleotide::U,
            'N' | 'R' | 'Y' | 'K' | 'M' | 'S' | 'W' | 'B' | 'D' | 'H' | 'V' => Nucleotide::N,
            _ => return Err(SequenceError::InvalidSymbol(c)),
        })
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("Invalid nucleotide symbol '{0}'")]
    InvalidSymbol(char),
    #[error("Sequence is empty")]
    Empty,
}

/// An immutable RNA sequence.
///
/// Indexing through [`Sequence::base_at`] is 1-based, the convention used by
/// every pair reference in the crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sequence {
    bases: Vec<Nucleotide>,
}

impl Sequence {
    pub fn new(bases: Vec<Nucleotide>) -> Result<Self, SequenceError> {
        if bases.is_empty() {
            return Err(SequenceError::Empty);
        }
        Ok(Self { bases })
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn bases(&self) -> &[Nucleotide] {
        &self.bases
    }

    /// Base at a 1-based position, `None` when out of range.
    pub fn base_at(&self, position: usize) -> Option<Nucleotide> {
        position
            .checked_sub(1)
            .and_then(|offset| self.bases.get(offset).copied())
    }
}

impl FromStr for Sequence {
    type Err = SequenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bases = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(Nucleotide::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(bases)
    }
}

impl TryFrom<String> for Sequence {
    type Error = SequenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sequence> for String {
    fn from(sequence: Sequence) -> Self {
        sequence.to_string()
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in &self.bases {
            write!(f, "{}", base.to_char())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_alphabet_case_insensitively() {
        let seq: Sequence = "gcAU".parse().unwrap();
        assert_eq!(
            seq.bases(),
            &[Nucleotide::G, Nucleotide::C, Nucleotide::A, Nucleotide::U]
        );
        assert_eq!(seq.to_string(), "GCAU");
    }

    #[test]
    fn thymine_is_read_as_uracil_and_ambiguity_codes_as_n() {
        let seq: Sequence = "TRN".parse().unwrap();
        assert_eq!(
            seq.bases(),
            &[Nucleotide::U, Nucleotide::N, Nucleotide::N]
        );
    }

    #[test]
    fn rejects_invalid_symbols() {
        assert_eq!(
            "GC-A".parse::<Sequence>(),
            Err(SequenceError::InvalidSymbol('-'))
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!("".parse::<Sequence>(), Err(SequenceError::Empty));
        assert_eq!(" \n".parse::<Sequence>(), Err(SequenceError::Empty));
    }

    #[test]
    fn base_at_is_one_based() {
        let seq: Sequence = "GCAU".parse().unwrap();
        assert_eq!(seq.base_at(0), None);
        assert_eq!(seq.base_at(1), Some(Nucleotide::G));
        assert_eq!(seq.base_at(4), Some(Nucleotide::U));
        assert_eq!(seq.base_at(5), None);
    }

    #[test]
    fn pairs_with_accepts_exactly_the_six_canonical_pairs() {
        use Nucleotide::*;
        let all = [A, C, G, U, N];
        let mut count = 0;
        for &a in &all {
            for &b in &all {
                if a.pairs_with(b) {
                    count += 1;
                }
            }
        }
        assert_eq!(count, 6);
        assert!(G.pairs_with(U));
        assert!(!A.pairs_with(G));
        assert!(!N.pairs_with(U));
    }

    #[test]
    fn serializes_as_plain_string() {
        let seq: Sequence = "GCAU".parse().unwrap();
        let json = serde_json::to_string(&seq).unwrap();
        assert_eq!(json, "\"GCAU\"");
        let back: Sequence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, seq);
    }
}
