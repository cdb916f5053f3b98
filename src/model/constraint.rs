use serde::{Deserialize, Serialize};

use crate::language::{ast::ConstraintExpr, parser};

/// A constraint of the model: either a relational expression written in the
/// micro-language, or an all-different over an aggregate or bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelConstraint {
    Expression(ExpressionConstraint),
    AllDifferent(AllDifferentConstraint),
}

impl ModelConstraint {
    pub fn name(&self) -> &str {
        match self {
            ModelConstraint::Expression(c) => &c.name,
            ModelConstraint::AllDifferent(c) => &c.name,
        }
    }
}

/// A relational constraint with its raw template text and the AST parsed from
/// it.
///
/// The AST is produced once, when the constraint is created, and never
/// mutated. `expr` is `None` when the text is empty or malformed; validation
/// reports that state instead of failing construction, so a model assembled
/// from user input can collect every problem in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionConstraint {
    pub name: String,
    pub text: String,
    pub expr: Option<ConstraintExpr>,
}

impl ExpressionConstraint {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let expr = parser::parse_constraint(&text).ok();
        Self {
            name: name.into(),
            text,
            expr,
        }
    }

    pub fn has_expander(&self) -> bool {
        self.expr
            .as_ref()
            .is_some_and(|expr| expr.expander.is_some())
    }
}

/// Requires every element of the subject aggregate or bucket to take a
/// distinct value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllDifferentConstraint {
    pub name: String,
    /// Name of the aggregate or bucket whose elements must differ.
    pub subject: String,
}

impl AllDifferentConstraint {
    pub fn new(name: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
        }
    }
}
