use serde::{Deserialize, Serialize};

/// A literal value appearing on one side of a relational expression or as a
/// domain band endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Char(char),
    /// A bare or quoted item name, resolved against a list domain at
    /// conversion time.
    Item(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Char(c) => write!(f, "'{}'", c),
            Literal::Item(s) => write!(f, "{}", s),
        }
    }
}

/// The six relational operators of the micro-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    Equals,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl RelOp {
    /// Evaluates the operator over two solver integers.
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            RelOp::Equals => lhs == rhs,
            RelOp::NotEqual => lhs != rhs,
            RelOp::Greater => lhs > rhs,
            RelOp::GreaterOrEqual => lhs >= rhs,
            RelOp::Less => lhs < rhs,
            RelOp::LessOrEqual => lhs <= rhs,
        }
    }

    /// The operator with its operands swapped (`a op b` iff `b op.flip() a`).
    pub fn flip(self) -> Self {
        match self {
            RelOp::Equals => RelOp::Equals,
            RelOp::NotEqual => RelOp::NotEqual,
            RelOp::Greater => RelOp::Less,
            RelOp::GreaterOrEqual => RelOp::LessOrEqual,
            RelOp::Less => RelOp::Greater,
            RelOp::LessOrEqual => RelOp::GreaterOrEqual,
        }
    }
}

/// Arithmetic offset attached to a variable reference (`$x + 2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Subtract,
}

/// A subscript on an aggregate reference: a concrete 1-based index, or a
/// counter name awaiting substitution by the repeater.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subscript {
    Index(i64),
    Counter(String),
}

/// A reference to a model variable, optionally subscripted and offset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableRef {
    pub name: String,
    pub subscript: Option<Subscript>,
    pub offset: Option<(ArithOp, i64)>,
}

impl VariableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subscript: None,
            offset: None,
        }
    }

    /// The signed value of the arithmetic offset, zero when absent.
    pub fn offset_value(&self) -> i64 {
        match self.offset {
            Some((ArithOp::Add, n)) => n,
            Some((ArithOp::Subtract, n)) => -n,
            None => 0,
        }
    }
}

/// One side of a relational expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Literal(Literal),
    Variable(VariableRef),
    /// A bare counter name; becomes an integer literal once the repeater has
    /// substituted it.
    Counter(String),
}

impl Operand {
    pub fn is_literal(&self) -> bool {
        matches!(self, Operand::Literal(_))
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Operand::Variable(_))
    }

    pub fn as_variable(&self) -> Option<&VariableRef> {
        match self {
            Operand::Variable(v) => Some(v),
            Operand::Literal(_) | Operand::Counter(_) => None,
        }
    }
}

/// The bound source for a counter: a constant, an earlier counter's live
/// value, or the declared size of a model entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitExpr {
    Literal(i64),
    Counter(String),
    Size(String),
}

/// How a counter iterates: `Count(n)` runs `1..=n`, `Range(lo, hi)` runs
/// `lo..=hi`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterPolicy {
    Count(LimitExpr),
    Range(LimitExpr, LimitExpr),
}

/// One declared counter of an expander clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterDecl {
    pub name: String,
    pub policy: CounterPolicy,
}

/// The trailing `| i in 1..3, j in i` clause of a parameterized constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpanderDecl {
    pub counters: Vec<CounterDecl>,
}

/// A parsed constraint expression: `lhs op rhs`, optionally parameterized by
/// an expander. Immutable once parsed; parsing the same text twice yields
/// structurally equal trees.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintExpr {
    pub lhs: Operand,
    pub op: RelOp,
    pub rhs: Operand,
    pub expander: Option<ExpanderDecl>,
}

/// A band endpoint of an inline range domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Band {
    Int(i64),
    Char(char),
    Size(String),
}

/// A parsed domain expression. Evaluates once, at conversion time, to a
/// [`DomainValue`](crate::solve::domain_value::DomainValue).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainExpr {
    Range { lower: Band, upper: Band },
    List(Vec<String>),
    /// A reference to a shared named domain.
    Reference(String),
}
