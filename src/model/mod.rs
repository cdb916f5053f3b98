//! The model value objects: variables, shared domains, bundles and
//! constraints, plus the validation pass that gates a solve.
//!
//! A [`Model`] is assembled once, through [`ModelBuilder`] or an external
//! reader, and treated as read-only input to every solve call.

pub mod constraint;
pub mod validation;
pub mod variable;

use serde::{Deserialize, Serialize};

pub use constraint::{AllDifferentConstraint, ExpressionConstraint, ModelConstraint};
pub use variable::{Bundle, BundleMember, SharedDomain, Variable};

use crate::{
    error::{Error, Result},
    language::{ast::DomainExpr, parser},
    model::validation::ValidationContext,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub variables: Vec<Variable>,
    pub shared_domains: Vec<SharedDomain>,
    pub bundles: Vec<Bundle>,
    pub constraints: Vec<ModelConstraint>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder::new(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn shared_domain(&self, name: &str) -> Option<&SharedDomain> {
        self.shared_domains.iter().find(|d| d.name == name)
    }

    pub fn bundle(&self, name: &str) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.name == name)
    }

    /// The declared size of a variable, for `size(entity)` resolution.
    pub fn size_of(&self, name: &str) -> Option<i64> {
        self.variable(name).map(|v| v.size() as i64)
    }

    /// Checks the model's structural invariants, accumulating every failure
    /// into `context`. Returns `true` when this pass added no errors.
    pub fn validate(&self, context: &mut ValidationContext) -> bool {
        validation::validate(self, context)
    }
}

/// Fluent construction of a [`Model`].
///
/// Domain text is parsed as each variable is added; parse failures are
/// deferred and reported by [`build`](ModelBuilder::build), so a chain of
/// calls stays readable. Constraint text is carried into the model as-is and
/// judged by validation.
#[derive(Debug)]
pub struct ModelBuilder {
    name: String,
    variables: Vec<Variable>,
    shared_domains: Vec<SharedDomain>,
    bundles: Vec<Bundle>,
    constraints: Vec<ModelConstraint>,
    errors: Vec<Error>,
}

impl ModelBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: Vec::new(),
            shared_domains: Vec::new(),
            bundles: Vec::new(),
            constraints: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn parse_domain(&mut self, text: &str) -> DomainExpr {
        match parser::parse_domain(text) {
            Ok(domain) => domain,
            Err(error) => {
                self.errors.push(error);
                // Placeholder; build() fails before this is observable.
                DomainExpr::List(Vec::new())
            }
        }
    }

    pub fn singleton(mut self, name: impl Into<String>, domain: &str) -> Self {
        let domain = self.parse_domain(domain);
        self.variables.push(Variable::Singleton {
            name: name.into(),
            domain,
        });
        self
    }

    /// A singleton whose domain is a reference to a shared domain.
    pub fn singleton_ref(mut self, name: impl Into<String>, shared: impl Into<String>) -> Self {
        self.variables.push(Variable::Singleton {
            name: name.into(),
            domain: DomainExpr::Reference(shared.into()),
        });
        self
    }

    pub fn aggregate(mut self, name: impl Into<String>, size: usize, domain: &str) -> Self {
        let domain = self.parse_domain(domain);
        self.variables.push(Variable::Aggregate {
            name: name.into(),
            size,
            domain,
        });
        self
    }

    pub fn aggregate_ref(
        mut self,
        name: impl Into<String>,
        size: usize,
        shared: impl Into<String>,
    ) -> Self {
        self.variables.push(Variable::Aggregate {
            name: name.into(),
            size,
            domain: DomainExpr::Reference(shared.into()),
        });
        self
    }

    pub fn shared_domain(mut self, name: impl Into<String>, domain: &str) -> Self {
        let domain = self.parse_domain(domain);
        self.shared_domains.push(SharedDomain {
            name: name.into(),
            domain,
        });
        self
    }

    /// Declares a bundle template from `(member name, domain text)` pairs.
    pub fn bundle<'a>(
        mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let members = members
            .into_iter()
            .map(|(member, domain)| {
                let domain = self.parse_domain(domain);
                BundleMember {
                    name: member.to_string(),
                    domain,
                }
            })
            .collect();
        self.bundles.push(Bundle {
            name: name.into(),
            members,
        });
        self
    }

    pub fn bucket(
        mut self,
        name: impl Into<String>,
        size: usize,
        bundle: impl Into<String>,
    ) -> Self {
        self.variables.push(Variable::Bucket {
            name: name.into(),
            size,
            bundle: bundle.into(),
        });
        self
    }

    pub fn constraint(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.constraints.push(ModelConstraint::Expression(
            ExpressionConstraint::new(name, text),
        ));
        self
    }

    pub fn all_different(mut self, name: impl Into<String>, subject: impl Into<String>) -> Self {
        self.constraints.push(ModelConstraint::AllDifferent(
            AllDifferentConstraint::new(name, subject),
        ));
        self
    }

    pub fn build(mut self) -> Result<Model> {
        if let Some(error) = self.errors.drain(..).next() {
            return Err(error);
        }
        Ok(Model {
            name: self.name,
            variables: self.variables,
            shared_domains: self.shared_domains,
            bundles: self.bundles,
            constraints: self.constraints,
        })
    }
}
