use std::collections::{HashSet, VecDeque};

use crate::backend::{PropagatorId, VariableId};

/// FIFO queue of `(variable, propagator)` arcs awaiting revision, with
/// membership tracking so an arc is never queued twice.
#[derive(Debug, Default)]
pub struct WorkList {
    queue: VecDeque<(VariableId, PropagatorId)>,
    members: HashSet<(VariableId, PropagatorId)>,
}

impl WorkList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, variable: VariableId, propagator: PropagatorId) {
        if self.members.insert((variable, propagator)) {
            self.queue.push_back((variable, propagator));
        }
    }

    pub fn pop_front(&mut self) -> Option<(VariableId, PropagatorId)> {
        let item = self.queue.pop_front()?;
        let _ = self.members.remove(&item);
        Some(item)
    }
}
