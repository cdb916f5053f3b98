use im::HashMap;

use crate::backend::{domain::Domain, VariableId};

/// One immutable state in the backend's search space: the current domain of
/// every decision variable.
///
/// Persistent maps make cloning a `Space` cheap; branching in the search
/// produces a new `Space` per guess rather than undoing mutations on
/// backtrack.
#[derive(Debug, Clone, Default)]
pub struct Space {
    pub domains: HashMap<VariableId, Domain>,
}

impl Space {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, variable: VariableId, domain: Domain) {
        let _ = self.domains.insert(variable, domain);
    }

    /// True when every variable's domain is a singleton.
    pub fn is_complete(&self) -> bool {
        self.domains.values().all(Domain::is_singleton)
    }

    /// True when some variable has no values left.
    pub fn has_empty_domain(&self) -> bool {
        self.domains.values().any(Domain::is_empty)
    }

    /// Picks the unassigned variable with the smallest remaining domain,
    /// breaking ties by id so the search is deterministic.
    pub fn select_unassigned(&self) -> Option<VariableId> {
        self.domains
            .iter()
            .filter(|(_, domain)| domain.len() > 1)
            .min_by_key(|(id, domain)| (domain.len(), **id))
            .map(|(id, _)| *id)
    }

    /// A new space with one variable's domain replaced.
    pub fn with_domain(&self, variable: VariableId, domain: Domain) -> Self {
        Self {
            domains: self.domains.update(variable, domain),
        }
    }
}
