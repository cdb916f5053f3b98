use serde::{Deserialize, Serialize};

use crate::language::ast::DomainExpr;

/// A model decision variable.
///
/// Variables come in three kinds: a `Singleton` is one scalar, an `Aggregate`
/// is a fixed-size ordered array of scalars sharing one domain, and a
/// `Bucket` instantiates a named [`Bundle`] template once per slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variable {
    Singleton {
        name: String,
        domain: DomainExpr,
    },
    Aggregate {
        name: String,
        size: usize,
        domain: DomainExpr,
    },
    Bucket {
        name: String,
        size: usize,
        bundle: String,
    },
}

impl Variable {
    pub fn name(&self) -> &str {
        match self {
            Variable::Singleton { name, .. }
            | Variable::Aggregate { name, .. }
            | Variable::Bucket { name, .. } => name,
        }
    }

    /// The declared size: 1 for a singleton, the slot count otherwise.
    pub fn size(&self) -> usize {
        match self {
            Variable::Singleton { .. } => 1,
            Variable::Aggregate { size, .. } | Variable::Bucket { size, .. } => *size,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Variable::Aggregate { .. })
    }

    pub fn is_bucket(&self) -> bool {
        matches!(self, Variable::Bucket { .. })
    }
}

/// A named domain expression shared between variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedDomain {
    pub name: String,
    pub domain: DomainExpr,
}

/// One singleton slot of a [`Bundle`] template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleMember {
    pub name: String,
    pub domain: DomainExpr,
}

/// A reusable group of singleton declarations, instantiated per bucket slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bundle {
    pub name: String,
    pub members: Vec<BundleMember>,
}
