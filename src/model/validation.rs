//! Pre-solve model validation.
//!
//! Validation never stops at the first problem: every failure is accumulated
//! into a [`ValidationContext`] so a caller can display everything wrong with
//! a model at once. A model that fails validation is reported as
//! `InvalidModel`, not as an `Err`.

use crate::{
    language::ast::{
        Band, ConstraintExpr, CounterPolicy, DomainExpr, ExpanderDecl, LimitExpr, Operand,
        Subscript,
    },
    model::{constraint::ModelConstraint, Model, Variable},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("duplicate variable name {0:?}")]
    DuplicateVariable(String),

    #[error("constraint {0:?} has an empty expression")]
    EmptyExpression(String),

    #[error("constraint {0:?} has a malformed expression: {1}")]
    MalformedExpression(String, String),

    #[error("variable {0:?} has a non-positive size")]
    NonPositiveSize(String),

    #[error("constraint {constraint:?} references undeclared variable {variable:?}")]
    UnknownVariable { constraint: String, variable: String },

    #[error("constraint {constraint:?} subscripts {variable:?}, which is not an aggregate")]
    SubscriptOnNonAggregate { constraint: String, variable: String },

    #[error("constraint {constraint:?} subscript {index} is out of bounds for {variable:?}")]
    SubscriptOutOfBounds {
        constraint: String,
        variable: String,
        index: i64,
    },

    #[error("variable {variable:?} references unknown shared domain {domain:?}")]
    UnknownSharedDomain { variable: String, domain: String },

    #[error("bucket {bucket:?} references unknown bundle {bundle:?}")]
    UnknownBundle { bucket: String, bundle: String },

    #[error("constraint {constraint:?} applies all-different to {subject:?}, which is not an aggregate or bucket")]
    AllDifferentSubject { constraint: String, subject: String },

    #[error("constraint {constraint:?} declares counter {counter:?} more than once")]
    DuplicateCounter { constraint: String, counter: String },

    #[error("constraint {constraint:?} references undeclared counter {counter:?}")]
    UnknownCounter { constraint: String, counter: String },

    #[error("counter {counter:?} in constraint {constraint:?} may only reference counters declared before it")]
    CounterForwardReference { constraint: String, counter: String },

    #[error("size() in {context:?} references unknown entity {entity:?}")]
    UnknownSizeEntity { context: String, entity: String },

    #[error("domain of {0:?} is empty (lower bound exceeds upper bound)")]
    EmptyDomain(String),
}

/// Accumulates every validation failure found in one pass over a model.
#[derive(Debug, Default)]
pub struct ValidationContext {
    errors: Vec<ValidationError>,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

pub(crate) fn validate(model: &Model, context: &mut ValidationContext) -> bool {
    let before = context.errors.len();

    for shared in &model.shared_domains {
        validate_domain(model, &shared.name, &shared.domain, context);
    }
    validate_variables(model, context);
    for constraint in &model.constraints {
        match constraint {
            ModelConstraint::Expression(c) => {
                if c.text.trim().is_empty() {
                    context.add_error(ValidationError::EmptyExpression(c.name.clone()));
                } else {
                    match &c.expr {
                        Some(expr) => validate_expression(model, &c.name, expr, context),
                        None => context.add_error(ValidationError::MalformedExpression(
                            c.name.clone(),
                            c.text.clone(),
                        )),
                    }
                }
            }
            ModelConstraint::AllDifferent(c) => {
                let compound = model
                    .variable(&c.subject)
                    .is_some_and(|v| v.is_aggregate() || v.is_bucket());
                if !compound {
                    context.add_error(ValidationError::AllDifferentSubject {
                        constraint: c.name.clone(),
                        subject: c.subject.clone(),
                    });
                }
            }
        }
    }

    context.errors.len() == before
}

fn validate_variables(model: &Model, context: &mut ValidationContext) {
    let mut seen = std::collections::HashSet::new();
    for variable in &model.variables {
        if !seen.insert(variable.name()) {
            context.add_error(ValidationError::DuplicateVariable(
                variable.name().to_string(),
            ));
        }

        match variable {
            Variable::Singleton { name, domain } => {
                validate_domain(model, name, domain, context);
            }
            Variable::Aggregate { name, size, domain } => {
                if *size == 0 {
                    context.add_error(ValidationError::NonPositiveSize(name.clone()));
                }
                validate_domain(model, name, domain, context);
            }
            Variable::Bucket { name, size, bundle } => {
                if *size == 0 {
                    context.add_error(ValidationError::NonPositiveSize(name.clone()));
                }
                match model.bundle(bundle) {
                    Some(b) => {
                        for member in &b.members {
                            validate_domain(model, &b.name, &member.domain, context);
                        }
                    }
                    None => context.add_error(ValidationError::UnknownBundle {
                        bucket: name.clone(),
                        bundle: bundle.clone(),
                    }),
                }
            }
        }
    }
}

fn validate_domain(
    model: &Model,
    owner: &str,
    domain: &DomainExpr,
    context: &mut ValidationContext,
) {
    match domain {
        DomainExpr::Range { lower, upper } => {
            for band in [lower, upper] {
                if let Band::Size(entity) = band {
                    if model.variable(entity).is_none() {
                        context.add_error(ValidationError::UnknownSizeEntity {
                            context: owner.to_string(),
                            entity: entity.clone(),
                        });
                    }
                }
            }
            if let (Some(lo), Some(hi)) = (band_value(model, lower), band_value(model, upper)) {
                if lo > hi {
                    context.add_error(ValidationError::EmptyDomain(owner.to_string()));
                }
            }
        }
        DomainExpr::List(_) => {}
        DomainExpr::Reference(name) => {
            if model.shared_domain(name).is_none() {
                context.add_error(ValidationError::UnknownSharedDomain {
                    variable: owner.to_string(),
                    domain: name.clone(),
                });
            }
        }
    }
}

fn band_value(model: &Model, band: &Band) -> Option<i64> {
    match band {
        Band::Int(n) => Some(*n),
        Band::Char(c) => Some(*c as i64),
        Band::Size(entity) => model.size_of(entity),
    }
}

fn validate_expression(
    model: &Model,
    constraint: &str,
    expr: &ConstraintExpr,
    context: &mut ValidationContext,
) {
    let counter_names: Vec<&str> = expr
        .expander
        .iter()
        .flat_map(|e| e.counters.iter())
        .map(|c| c.name.as_str())
        .collect();

    for operand in [&expr.lhs, &expr.rhs] {
        match operand {
            Operand::Variable(var) => {
                let Some(declared) = model.variable(&var.name) else {
                    context.add_error(ValidationError::UnknownVariable {
                        constraint: constraint.to_string(),
                        variable: var.name.clone(),
                    });
                    continue;
                };
                match &var.subscript {
                    Some(_) if !declared.is_aggregate() => {
                        context.add_error(ValidationError::SubscriptOnNonAggregate {
                            constraint: constraint.to_string(),
                            variable: var.name.clone(),
                        });
                    }
                    Some(Subscript::Index(index)) => {
                        if *index < 1 || *index > declared.size() as i64 {
                            context.add_error(ValidationError::SubscriptOutOfBounds {
                                constraint: constraint.to_string(),
                                variable: var.name.clone(),
                                index: *index,
                            });
                        }
                    }
                    Some(Subscript::Counter(counter)) => {
                        if !counter_names.contains(&counter.as_str()) {
                            context.add_error(ValidationError::UnknownCounter {
                                constraint: constraint.to_string(),
                                counter: counter.clone(),
                            });
                        }
                    }
                    None => {}
                }
            }
            Operand::Literal(_) | Operand::Counter(_) => {}
        }
    }

    if let Some(expander) = &expr.expander {
        validate_expander(model, constraint, expander, context);
    }
}

fn validate_expander(
    model: &Model,
    constraint: &str,
    expander: &ExpanderDecl,
    context: &mut ValidationContext,
) {
    let mut earlier: Vec<&str> = Vec::new();
    for counter in &expander.counters {
        if earlier.contains(&counter.name.as_str()) {
            context.add_error(ValidationError::DuplicateCounter {
                constraint: constraint.to_string(),
                counter: counter.name.clone(),
            });
        }

        let limits: Vec<&LimitExpr> = match &counter.policy {
            CounterPolicy::Count(limit) => vec![limit],
            CounterPolicy::Range(start, end) => vec![start, end],
        };
        for limit in limits {
            match limit {
                LimitExpr::Literal(_) => {}
                // A bound may only reach counters declared before this one.
                LimitExpr::Counter(name) => {
                    if !earlier.contains(&name.as_str()) {
                        context.add_error(ValidationError::CounterForwardReference {
                            constraint: constraint.to_string(),
                            counter: name.clone(),
                        });
                    }
                }
                LimitExpr::Size(entity) => {
                    if model.variable(entity).is_none() {
                        context.add_error(ValidationError::UnknownSizeEntity {
                            context: constraint.to_string(),
                            entity: entity.clone(),
                        });
                    }
                }
            }
        }

        earlier.push(counter.name.as_str());
    }
}
