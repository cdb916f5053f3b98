//! Trellis is a constraint modeling layer: models written against a small
//! textual constraint/domain micro-language are lowered onto a CSP solver
//! and solved, and bound solver values are lifted back into model-level
//! values.
//!
//! The crate is split into a modeling frontend and a solver backend:
//!
//! - **[`model`]**: variables (singletons, aggregates, buckets), shared
//!   domains and constraints, assembled through [`Model::builder`] and
//!   checked by an accumulate-everything validation pass.
//! - **[`language`]**: the micro-language AST and parser. A constraint reads
//!   like `$x[i] <> $y[i] | i in 1..3` — a relational expression with an
//!   optional trailing expander clause.
//! - **[`repeater`]**: expands one parameterized constraint template into
//!   many concrete constraints by enumerating its counters.
//! - **[`solve`]**: domain-value bijections, model-to-backend conversion,
//!   snapshot extraction and the [`Solver`](solve::Solver) facade.
//! - **[`backend`]**: the integer CSP engine the model is lowered onto
//!   (AC-3 propagation plus backtracking search).
//!
//! # Example: two values that must differ
//!
//! ```
//! use trellis::model::Model;
//! use trellis::solve::{SolveStatus, Solver};
//!
//! let model = Model::builder("pair")
//!     .aggregate("y", 2, "1..10")
//!     .constraint("distinct", "$y[1] <> $y[2]")
//!     .build()
//!     .unwrap();
//!
//! let result = Solver::new().solve(&model).unwrap();
//! assert_eq!(result.status, SolveStatus::Success);
//!
//! let snapshot = result.snapshot.unwrap();
//! let values = snapshot.aggregate_value("y").unwrap();
//! assert_ne!(values[0], values[1]);
//! ```
//!
//! [`Model::builder`]: model::Model::builder

pub mod backend;
pub mod error;
pub mod language;
pub mod model;
pub mod repeater;
pub mod solve;
