use crate::{
    backend::{propagator::Propagator, space::Space, VariableId},
    error::Result,
    language::ast::RelOp,
};

/// A binary relational rule `(x + a) op (y + b)` between two backend
/// variables, with optional integer offsets on either side.
///
/// Revision keeps a value in the target's domain iff some value in the other
/// variable's domain satisfies the relation, which gives arc consistency for
/// all six operators without per-operator pruning code.
#[derive(Debug, Clone)]
pub struct RelationPropagator {
    op: RelOp,
    vars: [VariableId; 2],
    offsets: [i64; 2],
}

impl RelationPropagator {
    pub fn new(op: RelOp, lhs: (VariableId, i64), rhs: (VariableId, i64)) -> Self {
        Self {
            op,
            vars: [lhs.0, rhs.0],
            offsets: [lhs.1, rhs.1],
        }
    }
}

impl Propagator for RelationPropagator {
    fn variables(&self) -> &[VariableId] {
        &self.vars
    }

    fn describe(&self) -> String {
        format!(
            "?{}{:+} {:?} ?{}{:+}",
            self.vars[0], self.offsets[0], self.op, self.vars[1], self.offsets[1]
        )
    }

    fn revise(&self, target: &VariableId, space: &Space) -> Result<Option<Space>> {
        let target_is_lhs = *target == self.vars[0];
        let other = if target_is_lhs {
            self.vars[1]
        } else {
            self.vars[0]
        };

        let target_domain = space.domains.get(target).unwrap();
        let other_domain = space.domains.get(&other).unwrap();

        let new_domain = target_domain.retain(|v| {
            other_domain.iter().any(|u| {
                let (lhs, rhs) = if target_is_lhs {
                    (v + self.offsets[0], u + self.offsets[1])
                } else {
                    (u + self.offsets[0], v + self.offsets[1])
                };
                self.op.holds(lhs, rhs)
            })
        });

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

    fn space(a: Domain, b: Domain) -> Space {
        let mut space = Space::new();
        space.insert(0, a);
        space.insert(1, b);
        space
    }

    #[test]
    fn less_than_prunes_both_sides() {
        let propagator = RelationPropagator::new(RelOp::Less, (0, 0), (1, 0));
        let space = space(Domain::range(1, 9), Domain::range(1, 5));

        let revised = propagator.revise(&0, &space).unwrap().unwrap();
        assert_eq!(
            revised.domains.get(&0).unwrap().iter().collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );

        let revised = propagator.revise(&1, &space).unwrap().unwrap();
        assert_eq!(
            revised.domains.get(&1).unwrap().iter().collect::<Vec<_>>(),
            vec![2, 3, 4, 5]
        );
    }

    #[test]
    fn offsets_shift_the_relation() {
        // x + 2 == y, x in 1..3, y in 1..9 -> y in 3..5
        let propagator = RelationPropagator::new(RelOp::Equals, (0, 2), (1, 0));
        let space = space(Domain::range(1, 3), Domain::range(1, 9));

        let revised = propagator.revise(&1, &space).unwrap().unwrap();
        assert_eq!(
            revised.domains.get(&1).unwrap().iter().collect::<Vec<_>>(),
            vec![3, 4, 5]
        );
    }

    #[test]
    fn not_equal_only_prunes_against_a_singleton() {
        let propagator = RelationPropagator::new(RelOp::NotEqual, (0, 0), (1, 0));

        let open = space(Domain::range(1, 3), Domain::range(1, 3));
        assert!(propagator.revise(&0, &open).unwrap().is_none());

        let pinned = space(Domain::range(1, 3), Domain::singleton(2));
        let revised = propagator.revise(&0, &pinned).unwrap().unwrap();
        assert_eq!(
            revised.domains.get(&0).unwrap().iter().collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    fn consistent_domains_are_left_alone() {
        let propagator = RelationPropagator::new(RelOp::LessOrEqual, (0, 0), (1, 0));
        let space = space(Domain::range(1, 3), Domain::range(3, 5));
        assert!(propagator.revise(&0, &space).unwrap().is_none());
    }
}
