//! # Workflows Module
//!
//! End-to-end entry points that chain the engine stages and report progress.
//!
//! - **Build** ([`build`]) - sequence to QUBO problem: catalog, scoring, filtering, matrix
//! - **Predict** ([`predict`]) - QUBO problem plus sampler to a predicted structure
//! - **Fold** ([`fold`]) - sequence to reference structure through a folding engine
//! - **Evaluate** ([`evaluate`]) - precision, recall and F1 of a prediction against a reference

pub mod build;
pub mod evaluate;
pub mod fold;
pub mod predict;
