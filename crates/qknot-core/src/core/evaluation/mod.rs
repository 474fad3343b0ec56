//! Set-based comparison of secondary structures.
//!
//! Structures from any representation (dot-bracket, connectivity table, raw
//! pair lists) are first normalized to a [`PairSet`](crate::core::models::pair::PairSet);
//! the comparator then classifies pairs into true/false positives and false
//! negatives and derives precision, recall and F1.

pub mod metrics;

pub use metrics::{Comparison, Metrics, compare};
