//! Lowers a validated [`Model`] onto the backend engine and lifts a solved
//! space back into a [`SolutionSnapshot`].
//!
//! All conversion state (the value mapper and the name → backend-variable
//! cache) is owned by one `Converter` instance, created fresh per solve call
//! and discarded with it. The cache is write-once: filled while variables
//! are converted, read-only while constraints are built and values
//! extracted.

use std::collections::HashMap;

use tracing::debug;

use crate::{
    backend::{
        domain::Domain,
        propagator::Propagator,
        propagators::{
            all_different::AllDifferentPropagator, bound::BoundPropagator,
            relation::RelationPropagator,
        },
        space::Space,
        VariableId,
    },
    error::{Error, Result},
    language::{
        ast::{ConstraintExpr, Literal, Operand, RelOp, Subscript, VariableRef},
        parser,
    },
    model::{constraint::ModelConstraint, Model, Variable},
    repeater::{substitute, Repeater},
    solve::{
        domain_value::{DomainValue, ModelValue},
        snapshot::{CompoundLabel, SingletonLabel, SolutionSnapshot},
    },
};

/// A cache entry: the backend variable(s) standing for one model variable
/// (or one bucket member, keyed `bucket.member`).
#[derive(Debug, Clone)]
enum Slot {
    Single(VariableId),
    Array(Vec<VariableId>),
}

pub(crate) struct Converter<'m> {
    model: &'m Model,
    mappers: HashMap<String, DomainValue>,
    cache: HashMap<String, Slot>,
    space: Space,
    propagators: Vec<Box<dyn Propagator>>,
    next_id: VariableId,
    trivially_false: bool,
}

impl<'m> Converter<'m> {
    pub(crate) fn new(model: &'m Model) -> Self {
        Self {
            model,
            mappers: HashMap::new(),
            cache: HashMap::new(),
            space: Space::new(),
            propagators: Vec::new(),
            next_id: 0,
            trivially_false: false,
        }
    }

    /// Builds backend variables and propagators for the whole model.
    pub(crate) fn convert(&mut self) -> Result<()> {
        self.convert_variables()?;
        for constraint in &self.model.constraints {
            self.convert_constraint(constraint)?;
        }
        Ok(())
    }

    pub(crate) fn propagators(&self) -> &[Box<dyn Propagator>] {
        &self.propagators
    }

    pub(crate) fn initial_space(&self) -> Space {
        self.space.clone()
    }

    /// True when some constraint evaluated to a constant falsehood, making
    /// the model infeasible without any search.
    pub(crate) fn is_infeasible(&self) -> bool {
        self.trivially_false
    }

    fn allocate(&mut self, domain_value: &DomainValue) -> VariableId {
        let (lower, upper) = domain_value.bounds();
        let id = self.next_id;
        self.next_id += 1;
        self.space.insert(id, Domain::range(lower, upper));
        id
    }

    fn convert_variables(&mut self) -> Result<()> {
        for variable in &self.model.variables {
            match variable {
                Variable::Singleton { name, domain } => {
                    let value = DomainValue::evaluate(domain, self.model)?;
                    let id = self.allocate(&value);
                    let _ = self.mappers.insert(name.clone(), value);
                    let _ = self.cache.insert(name.clone(), Slot::Single(id));
                }
                Variable::Aggregate { name, size, domain } => {
                    let value = DomainValue::evaluate(domain, self.model)?;
                    let ids = (0..*size).map(|_| self.allocate(&value)).collect();
                    let _ = self.mappers.insert(name.clone(), value);
                    let _ = self.cache.insert(name.clone(), Slot::Array(ids));
                }
                Variable::Bucket { name, size, bundle } => {
                    let bundle = self
                        .model
                        .bundle(bundle)
                        .ok_or_else(|| Error::UnknownVariable(bundle.clone()))?;
                    for member in &bundle.members {
                        let key = format!("{}.{}", name, member.name);
                        let value = DomainValue::evaluate(&member.domain, self.model)?;
                        let ids = (0..*size).map(|_| self.allocate(&value)).collect();
                        let _ = self.mappers.insert(key.clone(), value);
                        let _ = self.cache.insert(key, Slot::Array(ids));
                    }
                }
            }
        }
        Ok(())
    }

    fn convert_constraint(&mut self, constraint: &ModelConstraint) -> Result<()> {
        match constraint {
            ModelConstraint::Expression(c) => {
                let expr = c.expr.as_ref().ok_or_else(|| {
                    Error::UnsupportedConstruct(format!(
                        "constraint {:?} reached conversion without a parsed expression",
                        c.name
                    ))
                })?;

                match &expr.expander {
                    None => self.add_relational(expr)?,
                    Some(expander) => {
                        // The template is the text ahead of the expander
                        // clause; each combination is substituted in and
                        // re-parsed into a fresh concrete AST.
                        let template = c.text.split('|').next().unwrap_or_default();
                        let mut repeater = Repeater::new(expander, self.model)?;
                        let mut expansions = 0usize;
                        while repeater.next() {
                            let concrete_text = substitute(template, &repeater.bindings());
                            let concrete = parser::parse_constraint(&concrete_text)?;
                            self.add_relational(&concrete)?;
                            expansions += 1;
                        }
                        debug!(constraint = %c.name, expansions, "expanded constraint template");
                    }
                }
            }
            ModelConstraint::AllDifferent(c) => {
                let ids = self.compound_ids(&c.subject)?;
                self.propagators
                    .push(Box::new(AllDifferentPropagator::new(ids)));
            }
        }
        Ok(())
    }

    /// Converts one concrete relational AST into a propagator.
    fn add_relational(&mut self, expr: &ConstraintExpr) -> Result<()> {
        match (&expr.lhs, &expr.rhs) {
            (Operand::Variable(lhs), Operand::Variable(rhs)) => {
                let lhs = self.resolve(lhs)?;
                let rhs = self.resolve(rhs)?;
                self.propagators
                    .push(Box::new(RelationPropagator::new(expr.op, lhs, rhs)));
            }
            (Operand::Variable(var), Operand::Literal(literal)) => {
                // Literals are mapped through the left-hand variable's
                // domain, which is why that domain alone governs them.
                let constant = self.map_literal(&var.name, literal)?;
                let (id, offset) = self.resolve(var)?;
                self.propagators
                    .push(Box::new(BoundPropagator::new(expr.op, id, offset, constant)));
            }
            (Operand::Literal(literal), Operand::Variable(var)) => {
                let constant = self.map_literal(&var.name, literal)?;
                let (id, offset) = self.resolve(var)?;
                self.propagators.push(Box::new(BoundPropagator::new(
                    expr.op.flip(),
                    id,
                    offset,
                    constant,
                )));
            }
            (Operand::Literal(lhs), Operand::Literal(rhs)) => {
                // No variables involved (counters substituted into both
                // sides, say): the comparison either always holds, in which
                // case there is nothing to propagate, or it can never hold.
                if !literal_holds(expr.op, lhs, rhs)? {
                    self.trivially_false = true;
                }
            }
            (lhs, rhs) => {
                return Err(Error::UnsupportedConstruct(format!(
                    "relational expression over {:?} and {:?}",
                    lhs, rhs
                )));
            }
        }
        Ok(())
    }

    /// Looks a variable reference up in the cache, yielding the backend
    /// variable and the reference's integer offset.
    fn resolve(&self, var: &VariableRef) -> Result<(VariableId, i64)> {
        let slot = self
            .cache
            .get(&var.name)
            .ok_or_else(|| Error::UnknownVariable(var.name.clone()))?;

        let id = match (slot, &var.subscript) {
            (Slot::Single(id), None) => *id,
            (Slot::Single(_), Some(_)) => {
                return Err(Error::UnsupportedConstruct(format!(
                    "subscript on singleton {:?}",
                    var.name
                )));
            }
            (Slot::Array(ids), Some(Subscript::Index(index))) => {
                // Subscripts are 1-based in the micro-language.
                if *index < 1 || *index > ids.len() as i64 {
                    return Err(Error::SubscriptOutOfBounds {
                        variable: var.name.clone(),
                        index: *index,
                        size: ids.len(),
                    });
                }
                ids[*index as usize - 1]
            }
            (Slot::Array(_), Some(Subscript::Counter(counter))) => {
                return Err(Error::UnsupportedConstruct(format!(
                    "counter {:?} survived substitution",
                    counter
                )));
            }
            (Slot::Array(_), None) => {
                return Err(Error::UnsupportedConstruct(format!(
                    "aggregate {:?} used without a subscript",
                    var.name
                )));
            }
        };

        Ok((id, var.offset_value()))
    }

    fn map_literal(&self, variable: &str, literal: &Literal) -> Result<i64> {
        let mapper = self
            .mappers
            .get(variable)
            .ok_or_else(|| Error::UnknownVariable(variable.to_string()))?;
        let value = match literal {
            Literal::Int(n) => ModelValue::Int(*n),
            Literal::Char(c) => ModelValue::Char(*c),
            Literal::Item(item) => ModelValue::Item(item.clone()),
        };
        mapper.map_to(&value).ok_or_else(|| Error::DomainMapping {
            variable: variable.to_string(),
            value: value.to_string(),
        })
    }

    /// The backend variables of an aggregate, or of every member of a
    /// bucket's bundle.
    fn compound_ids(&self, subject: &str) -> Result<Vec<VariableId>> {
        match self.model.variable(subject) {
            Some(Variable::Aggregate { .. }) => match self.cache.get(subject) {
                Some(Slot::Array(ids)) => Ok(ids.clone()),
                _ => Err(Error::UnknownVariable(subject.to_string())),
            },
            Some(Variable::Bucket { name, bundle, .. }) => {
                let bundle = self
                    .model
                    .bundle(bundle)
                    .ok_or_else(|| Error::UnknownVariable(bundle.clone()))?;
                let mut ids = Vec::new();
                for member in &bundle.members {
                    match self.cache.get(&format!("{}.{}", name, member.name)) {
                        Some(Slot::Array(member_ids)) => ids.extend_from_slice(member_ids),
                        _ => return Err(Error::UnknownVariable(member.name.clone())),
                    }
                }
                Ok(ids)
            }
            _ => Err(Error::UnknownVariable(subject.to_string())),
        }
    }

    /// Reads every bound value out of a solved space and inverts it through
    /// the variable's domain mapping. The space is complete (the engine
    /// guarantees singletons), so no further validation happens here.
    pub(crate) fn extract(&self, space: &Space) -> Result<SolutionSnapshot> {
        let mut singletons = Vec::new();
        let mut aggregates = Vec::new();

        for variable in &self.model.variables {
            match variable {
                Variable::Singleton { name, .. } => {
                    let Some(Slot::Single(id)) = self.cache.get(name) else {
                        return Err(Error::UnknownVariable(name.clone()));
                    };
                    singletons.push(SingletonLabel {
                        variable: name.clone(),
                        value: self.invert(name, space, *id)?,
                    });
                }
                Variable::Aggregate { name, .. } => {
                    let Some(Slot::Array(ids)) = self.cache.get(name) else {
                        return Err(Error::UnknownVariable(name.clone()));
                    };
                    let values = ids
                        .iter()
                        .map(|id| self.invert(name, space, *id))
                        .collect::<Result<Vec<_>>>()?;
                    aggregates.push(CompoundLabel {
                        variable: name.clone(),
                        values,
                    });
                }
                Variable::Bucket { name, bundle, .. } => {
                    let bundle = self
                        .model
                        .bundle(bundle)
                        .ok_or_else(|| Error::UnknownVariable(bundle.clone()))?;
                    for member in &bundle.members {
                        let key = format!("{}.{}", name, member.name);
                        let Some(Slot::Array(ids)) = self.cache.get(&key) else {
                            return Err(Error::UnknownVariable(key));
                        };
                        let values = ids
                            .iter()
                            .map(|id| self.invert(&key, space, *id))
                            .collect::<Result<Vec<_>>>()?;
                        aggregates.push(CompoundLabel {
                            variable: key.clone(),
                            values,
                        });
                    }
                }
            }
        }

        Ok(SolutionSnapshot::new(singletons, aggregates))
    }

    fn invert(&self, mapper_key: &str, space: &Space, id: VariableId) -> Result<ModelValue> {
        // The engine only returns complete spaces.
        let bound = space.domains.get(&id).unwrap().singleton_value().unwrap();
        let mapper = self
            .mappers
            .get(mapper_key)
            .ok_or_else(|| Error::UnknownVariable(mapper_key.to_string()))?;
        mapper.map_from(bound).ok_or_else(|| Error::DomainMapping {
            variable: mapper_key.to_string(),
            value: bound.to_string(),
        })
    }
}

/// Evaluates a comparison between two literals. Items only support equality;
/// anything ordered over them is a construct the grammar admits but the
/// solver has no meaning for.
fn literal_holds(op: RelOp, lhs: &Literal, rhs: &Literal) -> Result<bool> {
    match (lhs, rhs) {
        (Literal::Int(a), Literal::Int(b)) => Ok(op.holds(*a, *b)),
        (Literal::Char(a), Literal::Char(b)) => Ok(op.holds(*a as i64, *b as i64)),
        (Literal::Item(a), Literal::Item(b)) => match op {
            RelOp::Equals => Ok(a == b),
            RelOp::NotEqual => Ok(a != b),
            _ => Err(Error::UnsupportedConstruct(format!(
                "ordered comparison of items {:?} and {:?}",
                a, b
            ))),
        },
        (a, b) => Err(Error::UnsupportedConstruct(format!(
            "comparison of {} and {}",
            a, b
        ))),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn converted(model: &Model) -> Converter<'_> {
        let mut converter = Converter::new(model);
        converter.convert().unwrap();
        converter
    }

    #[test]
    fn sizes_backend_variables_from_domain_values() {
        let model = Model::builder("m")
            .singleton("x", "3..9")
            .singleton("c", "'a'..'f'")
            .aggregate("y", 2, "1..4")
            .build()
            .unwrap();

        let converter = converted(&model);
        let space = converter.initial_space();
        assert_eq!(space.domains.len(), 4);
        assert_eq!(space.domains.get(&0).unwrap().min(), Some(3));
        assert_eq!(space.domains.get(&0).unwrap().max(), Some(9));
        // Character domains are sized 1..=6, not 'a'..='f'.
        assert_eq!(space.domains.get(&1).unwrap().min(), Some(1));
        assert_eq!(space.domains.get(&1).unwrap().max(), Some(6));
    }

    #[test]
    fn expander_emits_one_propagator_per_combination() {
        let model = Model::builder("m")
            .aggregate("x", 3, "1..9")
            .aggregate("y", 3, "1..9")
            .constraint("pairwise", "$x[i] <> $y[i] | i in 1..3")
            .build()
            .unwrap();

        let converter = converted(&model);
        assert_eq!(converter.propagators().len(), 3);
    }

    #[test]
    fn list_literal_maps_through_left_hand_domain() {
        let model = Model::builder("m")
            .shared_domain("colours", "red, green, blue")
            .singleton_ref("c", "colours")
            .constraint("is_green", "$c = green")
            .build()
            .unwrap();

        let converter = converted(&model);
        assert_eq!(converter.propagators().len(), 1);
        // green is the second item, so the bound is against solver value 2.
        assert_eq!(converter.propagators()[0].describe(), "?0+0 Equals 2");
    }

    #[test]
    fn counters_on_both_sides_evaluate_after_substitution() {
        let model = Model::builder("m")
            .singleton("x", "1..3")
            .constraint("triangle", "i <= j | i in 2, j in i..2")
            .build()
            .unwrap();

        let converter = converted(&model);
        // Every expansion holds, so nothing reaches the backend.
        assert_eq!(converter.propagators().len(), 0);
        assert!(!converter.is_infeasible());
    }

    #[test]
    fn false_literal_comparison_marks_the_model_infeasible() {
        let model = Model::builder("m")
            .singleton("x", "1..3")
            .constraint("never", "2 < 1")
            .build()
            .unwrap();

        let converter = converted(&model);
        assert!(converter.is_infeasible());
    }

    #[test]
    fn literal_outside_the_domain_is_a_mapping_defect() {
        let model = Model::builder("m")
            .singleton("x", "1..5")
            .constraint("impossible", "$x = 9")
            .build()
            .unwrap();

        let mut converter = Converter::new(&model);
        assert!(matches!(
            converter.convert(),
            Err(Error::DomainMapping { .. })
        ));
    }

    #[test]
    fn out_of_bounds_subscript_is_caught_during_conversion() {
        let model = Model::builder("m")
            .aggregate("y", 2, "1..5")
            .constraint("bad", "$y[i] > 1 | i in 1..3")
            .build()
            .unwrap();

        let mut converter = Converter::new(&model);
        assert!(matches!(
            converter.convert(),
            Err(Error::SubscriptOutOfBounds { .. })
        ));
    }

    #[test]
    fn bucket_members_become_per_slot_arrays() {
        let model = Model::builder("m")
            .bundle("cell", [("letter", "'a'..'c'"), ("weight", "1..3")])
            .bucket("row", 2, "cell")
            .all_different("distinct", "row")
            .build()
            .unwrap();

        let converter = converted(&model);
        // Two members, two slots each.
        assert_eq!(converter.initial_space().domains.len(), 4);
        assert_eq!(converter.propagators().len(), 1);
        assert_eq!(converter.propagators()[0].variables().len(), 4);
    }
}
