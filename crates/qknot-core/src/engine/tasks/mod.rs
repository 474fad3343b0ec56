//! The stages of the prediction pipeline.
//!
//! Each task is a pure function over its inputs; [`crate::workflows`] chains
//! them and handles progress reporting.

pub mod catalog;
pub mod extraction;
pub mod filter;
pub mod interaction;
