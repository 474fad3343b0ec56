//! # Engine Module
//!
//! Turns an RNA sequence into a QUBO (quadratic unconstrained binary
//! optimization) problem over candidate base pairs, and turns a solver's
//! answer back into a secondary structure.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - catalog, filter, penalty and extraction parameters
//! - **Problem** ([`problem`]) - the candidate list and interaction matrix, kept together
//! - **Sampling** ([`sampler`]) - the seam to external QUBO solvers and their sample sets
//! - **Folding** ([`folding`]) - the seam to external thermodynamic folding tools
//! - **Progress Monitoring** ([`progress`]) - stage reporting for front ends
//! - **Error Handling** ([`error`]) - engine-level errors
//!
//! The individual pipeline stages live in the crate-private `tasks` module
//! and are driven by [`crate::workflows`].

pub mod config;
pub mod error;
pub mod folding;
pub mod problem;
pub mod progress;
pub mod sampler;
pub(crate) mod tasks;
