use super::pair::{BasePair, PairError, PairSet};
use std::fmt;
use thiserror::Error;
use tracing::trace;

pub const UNPAIRED: char = '.';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketFamily {
    Round,  // ()
    Square, // []
    Curly,  // {}
    Angle,  // <>
}

impl BracketFamily {
    /// Families in the order they are handed out to successive pseudoknot layers.
    pub const ALL: [BracketFamily; 4] = [
        BracketFamily::Round,
        BracketFamily::Square,
        BracketFamily::Curly,
        BracketFamily::Angle,
    ];

    pub fn open(self) -> char {
        match self {
            BracketFamily::Round => '(',
            BracketFamily::Square => '[',
            BracketFamily::Curly => '{',
            BracketFamily::Angle => '<',
        }
    }

    pub fn close(self) -> char {
        match self {
            BracketFamily::Round => ')',
            BracketFamily::Square => ']',
            BracketFamily::Curly => '}',
            BracketFamily::Angle => '>',
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn classify(symbol: char) -> Option<(BracketFamily, bool)> {
        Self::ALL.iter().find_map(|&family| {
            if symbol == family.open() {
                Some((family, true))
            } else if symbol == family.close() {
                Some((family, false))
            } else {
                None
            }
        })
    }
}

/// How unbalanced brackets are treated when a dot-bracket string is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BracketPolicy {
    /// Unmatched closers are ignored and unmatched openers are dropped.
    #[default]
    Tolerant,
    /// Any unmatched bracket is reported as [`StructureError::Unbalanced`].
    Strict,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum StructureError {
    #[error("Unbalanced '{symbol}' at position {position}")]
    Unbalanced { symbol: char, position: usize },
    #[error("Structure length {structure} does not match sequence length {sequence}")]
    LengthMismatch { structure: usize, sequence: usize },
    #[error("Position {0} is used by more than one pair")]
    IllFormed(usize),
    #[error("Crossing pairs need more than {} bracket families", BracketFamily::ALL.len())]
    FamiliesExhausted,
    #[error(transparent)]
    Pair(#[from] PairError),
}

/// A secondary structure in dot-bracket notation, one symbol per position.
///
/// Any symbol outside the four bracket families counts as unpaired.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotBracket {
    symbols: Vec<char>,
}

impl DotBracket {
    pub fn new(structure: &str) -> Self {
        Self {
            symbols: structure.chars().collect(),
        }
    }

    /// Parses a structure line, ignoring any trailing annotation such as
    /// a free-energy value `(-12.30)` separated by whitespace.
    pub fn parse_line(line: &str) -> Self {
        Self::new(line.split_whitespace().next().unwrap_or(""))
    }

    pub fn unpaired(length: usize) -> Self {
        Self {
            symbols: vec![UNPAIRED; length],
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_chars(&self) -> &[char] {
        &self.symbols
    }

    /// Extracts the base pairs, matching each bracket family on its own stack.
    pub fn pairs(&self, policy: BracketPolicy) -> Result<PairSet, StructureError> {
        let mut stacks: [Vec<usize>; 4] = Default::default();
        let mut pairs = PairSet::new();

        for (offset, &symbol) in self.symbols.iter().enumerate() {
            let position = offset + 1;
            let Some((family, is_open)) = BracketFamily::classify(symbol) else {
                continue;
            };
            let stack = &mut stacks[family.index()];
            if is_open {
                stack.push(position);
            } else if let Some(opener) = stack.pop() {
                pairs.insert(BasePair::ordered(opener, position));
            } else {
                match policy {
                    BracketPolicy::Tolerant => {
                        trace!("Ignoring unmatched '{}' at position {}", symbol, position);
                    }
                    BracketPolicy::Strict => {
                        return Err(StructureError::Unbalanced { symbol, position });
                    }
                }
            }
        }

        for family in BracketFamily::ALL {
            let stack = &stacks[family.index()];
            if let Some(&position) = stack.first() {
                match policy {
                    BracketPolicy::Tolerant => {
                        trace!(
                            "Dropping {} unmatched '{}' opener(s)",
                            stack.len(),
                            family.open()
                        );
                    }
                    BracketPolicy::Strict => {
                        return Err(StructureError::Unbalanced {
                            symbol: family.open(),
                            position,
                        });
                    }
                }
            }
        }

        Ok(pairs)
    }

    /// Renders pairs with a single bracket family onto `length` positions.
    ///
    /// Pairs are written in iteration order, so on an ill-formed set the pair
    /// written later overwrites an earlier one at a shared position.
    pub fn render_simple<'a, I>(length: usize, pairs: I) -> Result<Self, StructureError>
    where
        I: IntoIterator<Item = &'a BasePair>,
    {
        let mut structure = Self::unpaired(length);
        for pair in pairs {
            if pair.j() > length {
                return Err(PairError::OutOfRange {
                    position: pair.j(),
                    length,
                }
                .into());
            }
            let (lo, hi) = pair.to_zero_based();
            structure.symbols[lo] = BracketFamily::Round.open();
            structure.symbols[hi] = BracketFamily::Round.close();
        }
        Ok(structure)
    }

    /// Renders a well-formed pair set, assigning each crossing layer to the
    /// next bracket family. Nested structures use only `()`.
    pub fn render(length: usize, pairs: &PairSet) -> Result<Self, StructureError> {
        if let Some((&position, _)) = pairs.conflicts().iter().next() {
            return Err(StructureError::IllFormed(position));
        }

        let mut layers: Vec<Vec<BasePair>> = Vec::new();
        for pair in pairs {
            let slot = layers
                .iter()
                .position(|layer| layer.iter().all(|placed| !placed.crosses(pair)));
            match slot {
                Some(idx) => layers[idx].push(*pair),
                None => layers.push(vec![*pair]),
            }
        }
        if layers.len() > BracketFamily::ALL.len() {
            return Err(StructureError::FamiliesExhausted);
        }

        let mut structure = Self::unpaired(length);
        for (layer, family) in layers.iter().zip(BracketFamily::ALL) {
            for pair in layer {
                if pair.j() > length {
                    return Err(PairError::OutOfRange {
                        position: pair.j(),
                        length,
                    }
                    .into());
                }
                let (lo, hi) = pair.to_zero_based();
                structure.symbols[lo] = family.open();
                structure.symbols[hi] = family.close();
            }
        }
        Ok(structure)
    }
}

impl fmt::Display for DotBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}
