//! The backend constraint engine the model is lowered onto.
//!
//! This is the crate's "external solver" collaborator: a self-contained
//! integer CSP engine (AC-3 propagation plus backtracking search over
//! persistent domains). Nothing in here knows about the micro-language or
//! the model; it sees only integer variables, domains and propagators.

pub mod domain;
pub mod engine;
pub mod propagator;
pub mod propagators;
pub mod space;
pub mod work_list;

pub type VariableId = u32;
pub type PropagatorId = usize;
