//! # QKnot Core Library
//!
//! RNA secondary structure prediction, pseudoknots included, formulated as a
//! Quadratic Unconstrained Binary Optimization (QUBO) problem over candidate
//! base pairs, together with set-based evaluation of predicted structures.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Sequence`, `BasePair`,
//!   `PairSet`, `DotBracket`), the empirical pair scoring table, file I/O for
//!   FASTA, dot-bracket, connectivity-table and pair-list formats, and the
//!   structure comparator.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the pipeline tasks (candidate
//!   catalog, filtering, interaction matrix construction, solution extraction),
//!   the `QuboProblem` composite that keeps candidates and matrix aligned, and
//!   the seams to the external annealing solver and folding engine.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures that tie the
//!   `engine` and `core` together: building a problem from a sequence,
//!   predicting a structure from solver samples, and evaluating predictions
//!   against reference structures.

pub mod core;
pub mod engine;
pub mod workflows;
