//! Empirical energetic weights for candidate base pairs.
//!
//! The model is a lookup keyed by the ordered base identities of a pair:
//! G-C pairs are the most favorable, A-U intermediate and G-U wobble pairs the
//! weakest of the canonical three. Anything missing from the table receives a
//! weak fallback score instead of an error.

mod defaults;
pub mod table;

pub use table::{PairScoreTable, ScoreTableError};
