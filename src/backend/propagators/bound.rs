use crate::{
    backend::{propagator::Propagator, space::Space, VariableId},
    error::Result,
    language::ast::RelOp,
};

/// A unary rule `(x + offset) op constant`, used when one side of a
/// relational constraint is a literal already mapped into solver integers.
#[derive(Debug, Clone)]
pub struct BoundPropagator {
    op: RelOp,
    vars: [VariableId; 1],
    offset: i64,
    constant: i64,
}

impl BoundPropagator {
    pub fn new(op: RelOp, var: VariableId, offset: i64, constant: i64) -> Self {
        Self {
            op,
            vars: [var],
            offset,
            constant,
        }
    }
}

impl Propagator for BoundPropagator {
    fn variables(&self) -> &[VariableId] {
        &self.vars
    }

    fn describe(&self) -> String {
        format!(
            "?{}{:+} {:?} {}",
            self.vars[0], self.offset, self.op, self.constant
        )
    }

    fn revise(&self, target: &VariableId, space: &Space) -> Result<Option<Space>> {
        let target_domain = space.domains.get(target).unwrap();
        let new_domain = target_domain.retain(|v| self.op.holds(v + self.offset, self.constant));

        if new_domain.len() < target_domain.len() {
            Ok(Some(space.with_domain(*target, new_domain)))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::backend::domain::Domain;

    #[test]
    fn greater_than_constant_prunes_lower_values() {
        let propagator = BoundPropagator::new(RelOp::Greater, 0, 0, 1);
        let mut space = Space::new();
        space.insert(0, Domain::range(1, 10));

        let revised = propagator.revise(&0, &space).unwrap().unwrap();
        assert_eq!(revised.domains.get(&0).unwrap().min(), Some(2));
        assert_eq!(revised.domains.get(&0).unwrap().max(), Some(10));
    }

    #[test]
    fn offset_applies_before_comparison() {
        // x - 2 >= 3  =>  x >= 5
        let propagator = BoundPropagator::new(RelOp::GreaterOrEqual, 0, -2, 3);
        let mut space = Space::new();
        space.insert(0, Domain::range(1, 10));

        let revised = propagator.revise(&0, &space).unwrap().unwrap();
        assert_eq!(revised.domains.get(&0).unwrap().min(), Some(5));
    }

    #[test]
    fn satisfied_bound_changes_nothing() {
        let propagator = BoundPropagator::new(RelOp::LessOrEqual, 0, 0, 10);
        let mut space = Space::new();
        space.insert(0, Domain::range(1, 10));
        assert!(propagator.revise(&0, &space).unwrap().is_none());
    }
}
