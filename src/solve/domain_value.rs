//! The bijection between model-level domain values and the contiguous
//! integer range the backend understands.

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    language::ast::{Band, DomainExpr},
    model::Model,
};

/// A model-level value: what the user declared and what a snapshot reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelValue {
    Int(i64),
    Char(char),
    Item(String),
}

impl std::fmt::Display for ModelValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelValue::Int(n) => write!(f, "{}", n),
            ModelValue::Char(c) => write!(f, "{}", c),
            ModelValue::Item(s) => write!(f, "{}", s),
        }
    }
}

/// A variable's evaluated domain, carrying the bijection to solver integers.
///
/// - `IntRange` maps identically: the backend works on `lower..=upper`.
/// - `CharRange` maps `c` to `(c - lower) + 1`, backend range `1..=size`.
/// - `List` maps an item to its 1-based index, backend range `1..=len`.
///
/// `map_to`/`map_from` return `None` for values outside the domain; the
/// caller treats that as a defect (a validated model never produces one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainValue {
    IntRange { lower: i64, upper: i64 },
    CharRange { lower: char, upper: char },
    List(Vec<String>),
}

impl DomainValue {
    /// Evaluates a domain expression against the model, resolving shared
    /// domain references and `size()` bands. Happens once per variable per
    /// solve.
    pub fn evaluate(expr: &DomainExpr, model: &Model) -> Result<Self> {
        match expr {
            DomainExpr::Range { lower, upper } => match (lower, upper) {
                (Band::Char(lo), Band::Char(hi)) => Ok(DomainValue::CharRange {
                    lower: *lo,
                    upper: *hi,
                }),
                (Band::Char(_), _) | (_, Band::Char(_)) => Err(Error::UnsupportedConstruct(
                    "range domain mixes character and integer bands".to_string(),
                )),
                (lo, hi) => Ok(DomainValue::IntRange {
                    lower: resolve_band(lo, model)?,
                    upper: resolve_band(hi, model)?,
                }),
            },
            DomainExpr::List(items) => Ok(DomainValue::List(items.clone())),
            DomainExpr::Reference(name) => {
                let shared = model
                    .shared_domain(name)
                    .ok_or_else(|| Error::UnknownVariable(name.clone()))?;
                if matches!(shared.domain, DomainExpr::Reference(_)) {
                    return Err(Error::UnsupportedConstruct(format!(
                        "shared domain {:?} is itself a reference",
                        name
                    )));
                }
                Self::evaluate(&shared.domain, model)
            }
        }
    }

    /// The backend-visible `[lower, upper]` used to size the decision
    /// variable.
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            DomainValue::IntRange { lower, upper } => (*lower, *upper),
            DomainValue::CharRange { lower, upper } => {
                (1, (*upper as i64) - (*lower as i64) + 1)
            }
            DomainValue::List(items) => (1, items.len() as i64),
        }
    }

    pub fn size(&self) -> i64 {
        let (lower, upper) = self.bounds();
        (upper - lower + 1).max(0)
    }

    /// Maps a model value into the backend's integer domain.
    pub fn map_to(&self, value: &ModelValue) -> Option<i64> {
        match (self, value) {
            (DomainValue::IntRange { lower, upper }, ModelValue::Int(n)) => {
                (*lower..=*upper).contains(n).then_some(*n)
            }
            (DomainValue::CharRange { lower, upper }, ModelValue::Char(c)) => (*lower..=*upper)
                .contains(c)
                .then(|| (*c as i64) - (*lower as i64) + 1),
            (DomainValue::List(items), ModelValue::Item(item)) => items
                .iter()
                .position(|candidate| candidate == item)
                .map(|index| index as i64 + 1),
            _ => None,
        }
    }

    /// Inverts a backend integer into the model value it stands for.
    pub fn map_from(&self, n: i64) -> Option<ModelValue> {
        match self {
            DomainValue::IntRange { lower, upper } => {
                (*lower..=*upper).contains(&n).then_some(ModelValue::Int(n))
            }
            DomainValue::CharRange { lower, upper } => {
                let code = (*lower as i64) + (n - 1);
                let c = u32::try_from(code).ok().and_then(char::from_u32)?;
                (*lower..=*upper).contains(&c).then_some(ModelValue::Char(c))
            }
            DomainValue::List(items) => {
                if n < 1 || n > items.len() as i64 {
                    return None;
                }
                Some(ModelValue::Item(items[n as usize - 1].clone()))
            }
        }
    }
}

fn resolve_band(band: &Band, model: &Model) -> Result<i64> {
    match band {
        Band::Int(n) => Ok(*n),
        Band::Size(entity) => model
            .size_of(entity)
            .ok_or_else(|| Error::UnknownVariable(entity.clone())),
        // Char bands are matched away before this is called.
        Band::Char(_) => Err(Error::UnsupportedConstruct(
            "range domain mixes character and integer bands".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;
    use crate::language::parser::parse_domain;

    fn evaluate(text: &str) -> DomainValue {
        let model = Model::builder("m").build().unwrap();
        DomainValue::evaluate(&parse_domain(text).unwrap(), &model).unwrap()
    }

    #[test]
    fn numeric_range_maps_identically() {
        let domain = evaluate("3..9");
        assert_eq!(domain.bounds(), (3, 9));
        for n in 3..=9 {
            assert_eq!(domain.map_to(&ModelValue::Int(n)), Some(n));
            assert_eq!(domain.map_from(n), Some(ModelValue::Int(n)));
        }
        assert_eq!(domain.map_to(&ModelValue::Int(2)), None);
        assert_eq!(domain.map_from(10), None);
    }

    #[test]
    fn character_range_maps_to_one_based_offsets() {
        let domain = evaluate("'a'..'f'");
        assert_eq!(domain.bounds(), (1, 6));
        assert_eq!(domain.map_to(&ModelValue::Char('a')), Some(1));
        assert_eq!(domain.map_to(&ModelValue::Char('f')), Some(6));
        assert_eq!(domain.map_from(1), Some(ModelValue::Char('a')));
        assert_eq!(domain.map_from(6), Some(ModelValue::Char('f')));
        assert_eq!(domain.map_to(&ModelValue::Char('g')), None);
    }

    #[test]
    fn list_domain_maps_to_one_based_indices() {
        let domain = evaluate("\"a\", \"b\", \"c\"");
        assert_eq!(domain.bounds(), (1, 3));
        assert_eq!(domain.map_to(&ModelValue::Item("b".to_string())), Some(2));
        assert_eq!(domain.map_from(2), Some(ModelValue::Item("b".to_string())));
        assert_eq!(domain.map_to(&ModelValue::Item("d".to_string())), None);
        assert_eq!(domain.map_from(0), None);
        assert_eq!(domain.map_from(4), None);
    }

    #[test]
    fn mismatched_value_kind_does_not_map() {
        let domain = evaluate("1..9");
        assert_eq!(domain.map_to(&ModelValue::Char('a')), None);
        assert_eq!(domain.map_to(&ModelValue::Item("a".to_string())), None);
    }

    #[test]
    fn size_band_resolves_against_the_model() {
        let model = Model::builder("m").aggregate("x", 7, "1..7").build().unwrap();
        let domain =
            DomainValue::evaluate(&parse_domain("1..size(x)").unwrap(), &model).unwrap();
        assert_eq!(domain, DomainValue::IntRange { lower: 1, upper: 7 });
    }

    #[test]
    fn shared_domain_reference_resolves() {
        let model = Model::builder("m")
            .shared_domain("colours", "red, green, blue")
            .build()
            .unwrap();
        let domain = DomainValue::evaluate(&DomainExpr::Reference("colours".to_string()), &model)
            .unwrap();
        assert_eq!(domain.size(), 3);
    }

    #[test]
    fn mixed_band_kinds_are_rejected() {
        let model = Model::builder("m").build().unwrap();
        let result = DomainValue::evaluate(&parse_domain("'a'..9").unwrap(), &model);
        assert!(matches!(result, Err(Error::UnsupportedConstruct(_))));
    }

    proptest! {
        #[test]
        fn int_range_bijection(lower in -100i64..100, width in 0i64..100, pick in 0i64..100) {
            let upper = lower + width;
            let domain = DomainValue::IntRange { lower, upper };
            let value = ModelValue::Int(lower + pick % (width + 1));

            let mapped = domain.map_to(&value).unwrap();
            prop_assert_eq!(domain.map_from(mapped), Some(value));
        }

        #[test]
        fn char_range_bijection(width in 0u32..25, pick in 0u32..25) {
            let lower = 'a';
            let upper = char::from_u32('a' as u32 + width).unwrap();
            let domain = DomainValue::CharRange { lower, upper };

            let n = (pick % (width + 1)) as i64 + 1;
            let value = domain.map_from(n).unwrap();
            prop_assert_eq!(domain.map_to(&value), Some(n));
        }

        #[test]
        fn list_bijection(len in 1usize..20, pick in 0usize..20) {
            let items: Vec<String> = (0..len).map(|i| format!("item{}", i)).collect();
            let domain = DomainValue::List(items);

            let n = (pick % len) as i64 + 1;
            let value = domain.map_from(n).unwrap();
            prop_assert_eq!(domain.map_to(&value), Some(n));
        }
    }
}
