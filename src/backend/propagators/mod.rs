//! The backend's propagation rules.

pub mod all_different;
pub mod bound;
pub mod relation;
