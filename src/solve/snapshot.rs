use serde::Serialize;

use crate::solve::domain_value::ModelValue;

/// The resolved value of one singleton variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SingletonLabel {
    pub variable: String,
    pub value: ModelValue,
}

/// The resolved values of one aggregate (or one bucket member across its
/// slots), in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompoundLabel {
    pub variable: String,
    pub values: Vec<ModelValue>,
}

/// The immutable outcome of one successful solve, keyed by variable name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SolutionSnapshot {
    singletons: Vec<SingletonLabel>,
    aggregates: Vec<CompoundLabel>,
}

impl SolutionSnapshot {
    pub fn new(singletons: Vec<SingletonLabel>, aggregates: Vec<CompoundLabel>) -> Self {
        Self {
            singletons,
            aggregates,
        }
    }

    pub fn singleton_value(&self, name: &str) -> Option<&ModelValue> {
        self.singletons
            .iter()
            .find(|label| label.variable == name)
            .map(|label| &label.value)
    }

    pub fn aggregate_value(&self, name: &str) -> Option<&[ModelValue]> {
        self.aggregates
            .iter()
            .find(|label| label.variable == name)
            .map(|label| label.values.as_slice())
    }

    pub fn singleton_values(&self) -> impl Iterator<Item = &SingletonLabel> {
        self.singletons.iter()
    }

    pub fn aggregate_values(&self) -> impl Iterator<Item = &CompoundLabel> {
        self.aggregates.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn lookup_by_name() {
        let snapshot = SolutionSnapshot::new(
            vec![SingletonLabel {
                variable: "x".to_string(),
                value: ModelValue::Int(4),
            }],
            vec![CompoundLabel {
                variable: "y".to_string(),
                values: vec![ModelValue::Int(1), ModelValue::Int(2)],
            }],
        );

        assert_eq!(snapshot.singleton_value("x"), Some(&ModelValue::Int(4)));
        assert_eq!(
            snapshot.aggregate_value("y"),
            Some([ModelValue::Int(1), ModelValue::Int(2)].as_slice())
        );
        assert_eq!(snapshot.singleton_value("missing"), None);
        assert_eq!(snapshot.aggregate_value("x"), None);
    }

    #[test]
    fn serializes_for_display_layers() {
        let snapshot = SolutionSnapshot::new(
            vec![SingletonLabel {
                variable: "c".to_string(),
                value: ModelValue::Item("red".to_string()),
            }],
            Vec::new(),
        );
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"red\""));
    }
}
