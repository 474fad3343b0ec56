//! Data models for RNA sequences and their secondary structures.

pub mod pair;
pub mod sequence;
pub mod structure;
