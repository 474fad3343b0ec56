//! # Core Module
//!
//! Fundamental building blocks for RNA secondary structure work.
//!
//! - **Molecular Representation** ([`models`]) - Nucleotide sequences, base pairs,
//!   pair sets and dot-bracket structures
//! - **Pair Scoring** ([`scoring`]) - Empirical per-pair energetic weights
//! - **File I/O** ([`io`]) - FASTA, dot-bracket, connectivity-table and pair-list formats
//! - **Evaluation** ([`evaluation`]) - Precision/recall/F1 over base-pair sets
//!
//! Positions in every public pair type are 1-based, matching the external file
//! formats. Conversions to 0-based offsets happen only at the string/array
//! boundary and are explicit (`BasePair::to_zero_based`).

pub mod evaluation;
pub mod io;
pub mod models;
pub mod scoring;
