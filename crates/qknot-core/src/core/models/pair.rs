use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PairError {
    #[error("Invalid base pair ({i}, {j}): positions must be distinct and 1-based")]
    Degenerate { i: usize, j: usize },
    #[error("Position {position} lies outside a structure of length {length}")]
    OutOfRange { position: usize, length: usize },
}

/// An unordered pair of 1-based sequence positions, stored with `i < j`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(usize, usize)", into = "(usize, usize)")]
pub struct BasePair {
    i: usize,
    j: usize,
}

impl BasePair {
    /// Builds a pair from two positions in either order.
    pub fn new(a: usize, b: usize) -> Result<Self, PairError> {
        if a == b || a == 0 || b == 0 {
            return Err(PairError::Degenerate { i: a, j: b });
        }
        Ok(Self {
            i: a.min(b),
            j: a.max(b),
        })
    }

    pub(crate) fn ordered(i: usize, j: usize) -> Self {
        debug_assert!(0 < i && i < j);
        Self { i, j }
    }

    #[inline]
    pub fn i(&self) -> usize {
        self.i
    }

    #[inline]
    pub fn j(&self) -> usize {
        self.j
    }

    /// Number of positions strictly between the two partners.
    pub fn loop_span(&self) -> usize {
        self.j - self.i
    }

    pub fn shares_endpoint(&self, other: &BasePair) -> bool {
        self.i == other.i || self.i == other.j || self.j == other.i || self.j == other.j
    }

    /// `true` when `other` is the pair immediately inside this one,
    /// i.e. `(i + 1, j - 1)`, forming one helix step.
    pub fn stacks_on(&self, other: &BasePair) -> bool {
        self.i + 1 == other.i && other.j + 1 == self.j
    }

    /// `true` when the two pairs cross (i < k < j < l), the signature of a pseudoknot.
    pub fn crosses(&self, other: &BasePair) -> bool {
        (self.i < other.i && other.i < self.j && self.j < other.j)
            || (other.i < self.i && self.i < other.j && other.j < self.j)
    }

    pub fn to_zero_based(&self) -> (usize, usize) {
        (self.i - 1, self.j - 1)
    }
}

impl TryFrom<(usize, usize)> for BasePair {
    type Error = PairError;

    fn try_from((a, b): (usize, usize)) -> Result<Self, Self::Error> {
        Self::new(a, b)
    }
}

impl From<BasePair> for (usize, usize) {
    fn from(pair: BasePair) -> Self {
        (pair.i, pair.j)
    }
}

impl fmt::Display for BasePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.i, self.j)
    }
}

/// The canonical comparison unit: a set of normalized base pairs.
///
/// A `PairSet` may be ill-formed (a position used by several pairs), which is
/// the case for raw solver output; [`PairSet::conflicts`] reports such positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairSet {
    pairs: BTreeSet<BasePair>,
}

impl PairSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw `(i, j)` tuples, normalizing their order.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, PairError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        pairs
            .into_iter()
            .map(|(a, b)| BasePair::new(a, b))
            .collect()
    }

    /// Builds a set from 0-based offset tuples.
    pub fn from_zero_based<I>(pairs: I) -> Result<Self, PairError>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        Self::from_pairs(pairs.into_iter().map(|(a, b)| (a + 1, b + 1)))
    }

    pub fn insert(&mut self, pair: BasePair) -> bool {
        self.pairs.insert(pair)
    }

    pub fn contains(&self, pair: &BasePair) -> bool {
        self.pairs.contains(pair)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BasePair> {
        self.pairs.iter()
    }

    pub fn intersection(&self, other: &PairSet) -> PairSet {
        self.pairs.intersection(&other.pairs).copied().collect()
    }

    pub fn difference(&self, other: &PairSet) -> PairSet {
        self.pairs.difference(&other.pairs).copied().collect()
    }

    pub fn max_position(&self) -> Option<usize> {
        self.pairs.iter().map(|p| p.j).max()
    }

    /// Positions that participate in more than one pair, with their partners.
    pub fn conflicts(&self) -> BTreeMap<usize, Vec<BasePair>> {
        let mut usage: BTreeMap<usize, Vec<BasePair>> = BTreeMap::new();
        for pair in &self.pairs {
            usage.entry(pair.i).or_default().push(*pair);
            usage.entry(pair.j).or_default().push(*pair);
        }
        usage.retain(|_, pairs| pairs.len() > 1);
        usage
    }

    pub fn is_well_formed(&self) -> bool {
        self.conflicts().is_empty()
    }

    pub fn has_crossing(&self) -> bool {
        let pairs: Vec<&BasePair> = self.pairs.iter().collect();
        pairs
            .iter()
            .enumerate()
            .any(|(k, a)| pairs[k + 1..].iter().any(|b| a.crosses(b)))
    }

    /// Partner table of `length` entries: entry `k - 1` holds the partner of
    /// position `k`, or 0 when unpaired. On ill-formed sets the pair visited
    /// last (in set order) wins at a shared position.
    pub fn pair_table(&self, length: usize) -> Result<Vec<usize>, PairError> {
        let mut table = vec![0; length];
        for pair in &self.pairs {
            if pair.j > length {
                return Err(PairError::OutOfRange {
                    position: pair.j,
                    length,
                });
            }
            table[pair.i - 1] = pair.j;
            table[pair.j - 1] = pair.i;
        }
        Ok(table)
    }
}

impl FromIterator<BasePair> for PairSet {
    fn from_iter<T: IntoIterator<Item = BasePair>>(iter: T) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PairSet {
    type Item = &'a BasePair;
    type IntoIter = std::collections::btree_set::Iter<'a, BasePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

impl IntoIterator for PairSet {
    type Item = BasePair;
    type IntoIter = std::collections::btree_set::IntoIter<BasePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}
