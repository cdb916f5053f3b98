use std::collections::HashMap;

use tracing::debug;

use crate::{
    backend::{
        domain::Domain, propagator::Propagator, space::Space, work_list::WorkList, PropagatorId,
        VariableId,
    },
    error::Result,
};

/// Counters gathered over one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_visited: u64,
    pub backtracks: u64,
    pub revisions: u64,
    pub prunings: u64,
}

/// The backend search engine: AC-3 propagation to a fixpoint, then
/// depth-first backtracking over the remaining open domains.
#[derive(Debug, Default)]
pub struct Engine;

impl Engine {
    pub fn new() -> Self {
        Self
    }

    /// Searches for a complete assignment.
    ///
    /// Returns `Ok((Some(space), stats))` with every domain a singleton when
    /// an assignment exists, and `Ok((None, stats))` when the problem is
    /// proven infeasible.
    pub fn solve(
        &self,
        propagators: &[Box<dyn Propagator>],
        initial: Space,
    ) -> Result<(Option<Space>, SearchStats)> {
        let mut stats = SearchStats::default();

        // Propagators only re-examine domains they prune, so a variable that
        // starts out empty has to be caught here.
        if initial.has_empty_domain() {
            return Ok((None, stats));
        }

        let Some(space) = self.propagate(propagators, initial, &mut stats)? else {
            return Ok((None, stats));
        };
        if space.is_complete() {
            return Ok((Some(space), stats));
        }

        let result = self.search(propagators, space, &mut stats)?;
        Ok((result, stats))
    }

    fn search(
        &self,
        propagators: &[Box<dyn Propagator>],
        space: Space,
        stats: &mut SearchStats,
    ) -> Result<Option<Space>> {
        stats.nodes_visited += 1;

        if space.is_complete() {
            return Ok(Some(space));
        }

        // Not complete, so some domain is either still open or empty; with
        // nothing left to branch on, one must be empty.
        let Some(branch_var) = space.select_unassigned() else {
            return Ok(None);
        };
        let domain = space.domains.get(&branch_var).unwrap().clone();

        for value in domain.iter() {
            let guess = space.with_domain(branch_var, Domain::singleton(value));

            if let Some(propagated) = self.propagate(propagators, guess, stats)? {
                if let Some(found) = self.search(propagators, propagated, stats)? {
                    return Ok(Some(found));
                }
            }
            stats.backtracks += 1;
        }

        Ok(None)
    }

    /// Runs the AC-3 worklist until no propagator can prune anything more.
    /// Returns `None` on a wiped-out domain (contradiction).
    fn propagate(
        &self,
        propagators: &[Box<dyn Propagator>],
        initial: Space,
        stats: &mut SearchStats,
    ) -> Result<Option<Space>> {
        let mut space = initial;

        let mut dependents: HashMap<VariableId, Vec<PropagatorId>> = HashMap::new();
        for (id, propagator) in propagators.iter().enumerate() {
            for var in propagator.variables() {
                dependents.entry(*var).or_default().push(id);
            }
        }

        let mut worklist = WorkList::new();
        for (id, propagator) in propagators.iter().enumerate() {
            for var in propagator.variables() {
                worklist.push_back(*var, id);
            }
        }

        while let Some((target_var, propagator_id)) = worklist.pop_front() {
            let propagator = &propagators[propagator_id];
            stats.revisions += 1;

            if let Some(new_space) = propagator.revise(&target_var, &space)? {
                let old_size = space.domains.get(&target_var).unwrap().len();
                let new_size = new_space.domains.get(&target_var).unwrap().len();

                if new_size == 0 {
                    debug!(
                        propagator = %propagator.describe(),
                        variable = target_var,
                        "domain wiped out"
                    );
                    return Ok(None);
                }

                if new_size < old_size {
                    stats.prunings += 1;
                    space = new_space;

                    // The target shrank; every other rule watching it gets
                    // another look at its remaining variables.
                    if let Some(watching) = dependents.get(&target_var) {
                        for &dependent_id in watching {
                            for &neighbour in propagators[dependent_id].variables() {
                                if neighbour != target_var {
                                    worklist.push_back(neighbour, dependent_id);
                                }
                            }
                        }
                    }
                }
            }
        }

        debug!("propagation reached a fixpoint");
        Ok(Some(space))
    }
}
