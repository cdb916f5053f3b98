use im::HashSet;

use crate::{
    backend::{propagator::Propagator, space::Space, VariableId},
    error::Result,
};

/// Requires every variable in the set to take a distinct value.
///
/// Consistency is achieved by waiting for a variable in the set to become a
/// singleton and pruning that value from the domains of its peers. Stronger
/// propagation exists (matching-based filtering), but singleton pruning is
/// simple and effective at this scale.
#[derive(Debug, Clone)]
pub struct AllDifferentPropagator {
    vars: Vec<VariableId>,
}

impl AllDifferentPropagator {
    pub fn new(vars: Vec<VariableId>) -> Self {
        Self { vars }
    }
}

impl Propagator for AllDifferentPropagator {
    fn variables(&self) -> &[VariableId] {
        &self.vars
    }

    fn describe(&self) -> String {
        let vars = self
            .vars
            .iter()
            .map(|v| format!("?{}", v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("AllDifferent({})", vars)
    }

    fn revise(&self, target: &VariableId, space: &Space) -> Result<Option<Space>> {
        let mut taken = HashSet::new();
        for var in &self.vars {
            if var != target {
                if let Some(value) = space.domains.get(var).and_then(|d| d.singleton_value()) {
                    let _ = taken.insert(value);
                }
            }
        }

        if taken.is_empty() {
            return Ok(None);
        }

        let target_domain = space.domains.get(target).unwrap();
        let new_domain = target_domain.retain(|v| !taken.contains(&v));

        if new_domain.len() < target_domain.len() {
            Ok(Some(space.with_domain(*target, new_domain)))
        } else {
            Ok(None)
        }
    }
}
