use crate::{
    backend::{space::Space, VariableId},
    error::Result,
};

/// A propagation rule over backend variables.
///
/// `revise` narrows the target variable's domain to the values still
/// consistent with this rule, returning a new [`Space`] when something was
/// pruned and `None` when the domain is unchanged. Propagators never mutate
/// a space in place.
pub trait Propagator: std::fmt::Debug {
    /// The variables this rule observes; the engine re-queues a rule whenever
    /// one of them is pruned.
    fn variables(&self) -> &[VariableId];

    /// A short human-readable rendering for logs.
    fn describe(&self) -> String;

    fn revise(&self, target: &VariableId, space: &Space) -> Result<Option<Space>>;
}
