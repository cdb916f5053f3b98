//! The solve facade: validation, conversion, delegated search, extraction.
//!
//! One [`Solver::solve`] call runs the whole pipeline synchronously. All
//! per-solve state (domain mappings, the backend variable cache, the search
//! space) lives inside the call and is discarded when it returns.

mod converter;
pub mod domain_value;
pub mod snapshot;

use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    backend::engine::{Engine, SearchStats},
    error::Result,
    model::{validation::ValidationContext, Model},
    solve::{converter::Converter, snapshot::SolutionSnapshot},
};

/// Outcome classification of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The backend found an assignment; the snapshot is populated.
    Success,
    /// The backend proved there is no feasible assignment. Not an error.
    Fail,
    /// The model failed validation; the validation context holds every
    /// problem found.
    InvalidModel,
}

/// The result of one solve call.
#[derive(Debug)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub duration: Duration,
    pub snapshot: Option<SolutionSnapshot>,
    pub validation: Option<ValidationContext>,
    pub stats: SearchStats,
}

impl SolveResult {
    pub fn is_success(&self) -> bool {
        self.status == SolveStatus::Success
    }
}

/// Solves models by lowering them onto the backend engine.
#[derive(Debug, Default)]
pub struct Solver;

impl Solver {
    pub fn new() -> Self {
        Self
    }

    /// Validates the model, converts it to backend form, runs the search and
    /// extracts a snapshot.
    ///
    /// Validation failures are a [`SolveStatus::InvalidModel`] result, and an
    /// infeasible model is [`SolveStatus::Fail`]; neither is an `Err`. An
    /// `Err` means a defect-level condition: malformed expansion text, a
    /// domain mapping miss, or an AST shape the converter does not support.
    pub fn solve(&self, model: &Model) -> Result<SolveResult> {
        let started = Instant::now();

        let mut context = ValidationContext::new();
        if !model.validate(&mut context) {
            debug!(model = %model.name, errors = context.errors().len(), "model failed validation");
            return Ok(SolveResult {
                status: SolveStatus::InvalidModel,
                duration: started.elapsed(),
                snapshot: None,
                validation: Some(context),
                stats: SearchStats::default(),
            });
        }

        let mut converter = Converter::new(model);
        converter.convert()?;
        debug!(
            model = %model.name,
            propagators = converter.propagators().len(),
            "model converted"
        );

        if converter.is_infeasible() {
            debug!(model = %model.name, "constant-false constraint, skipping search");
            return Ok(SolveResult {
                status: SolveStatus::Fail,
                duration: started.elapsed(),
                snapshot: None,
                validation: None,
                stats: SearchStats::default(),
            });
        }

        let engine = Engine::new();
        let (solution, stats) = engine.solve(converter.propagators(), converter.initial_space())?;

        let result = match solution {
            Some(space) => {
                let snapshot = converter.extract(&space)?;
                SolveResult {
                    status: SolveStatus::Success,
                    duration: started.elapsed(),
                    snapshot: Some(snapshot),
                    validation: None,
                    stats,
                }
            }
            None => SolveResult {
                status: SolveStatus::Fail,
                duration: started.elapsed(),
                snapshot: None,
                validation: None,
                stats,
            },
        };

        debug!(model = %model.name, status = ?result.status, "solve finished");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::solve::domain_value::ModelValue;

    fn solve(model: &Model) -> SolveResult {
        Solver::new().solve(model).unwrap()
    }

    #[test]
    fn singleton_with_lower_bound() {
        let model = Model::builder("bounded")
            .singleton("x", "1..10")
            .constraint("above_one", "$x > 1")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        let Some(ModelValue::Int(x)) = snapshot.singleton_value("x").cloned() else {
            panic!("expected an integer for x");
        };
        assert!((2..=10).contains(&x));
    }

    #[test]
    fn aggregate_elements_must_differ() {
        let model = Model::builder("pair")
            .aggregate("y", 2, "1..10")
            .constraint("distinct", "$y[1] <> $y[2]")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        let values = snapshot.aggregate_value("y").unwrap();
        assert_eq!(values.len(), 2);
        assert_ne!(values[0], values[1]);
    }

    #[test]
    fn expanded_template_constrains_every_index() {
        let model = Model::builder("expanded")
            .aggregate("x", 3, "1..3")
            .aggregate("y", 3, "1..3")
            .constraint("pairwise", "$x[i] <> $y[i] | i in 1..3")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        let x = snapshot.aggregate_value("x").unwrap();
        let y = snapshot.aggregate_value("y").unwrap();
        for slot in 0..3 {
            assert_ne!(x[slot], y[slot]);
        }
    }

    #[test]
    fn invalid_model_short_circuits() {
        let model = Model::builder("invalid")
            .singleton("x", "1..10")
            .constraint("uses_z", "$z > 1")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::InvalidModel);
        assert!(result.snapshot.is_none());
        assert!(!result.validation.unwrap().is_valid());
    }

    #[test]
    fn infeasible_model_fails_without_snapshot() {
        let model = Model::builder("infeasible")
            .singleton("x", "1..2")
            .constraint("too_low", "$x < 1")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Fail);
        assert!(result.snapshot.is_none());
    }

    #[test]
    fn inverted_range_domain_is_an_invalid_model() {
        let model = Model::builder("inverted")
            .singleton("x", "10..1")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::InvalidModel);
        assert!(result.snapshot.is_none());
        assert!(!result.validation.unwrap().is_valid());
    }

    #[test]
    fn false_literal_constraint_fails_the_solve() {
        let model = Model::builder("never")
            .singleton("x", "1..3")
            .constraint("contradiction", "2 < 1")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Fail);
        assert!(result.snapshot.is_none());
    }

    #[test]
    fn character_domain_round_trips() {
        let model = Model::builder("letters")
            .singleton("c", "'a'..'f'")
            .constraint("late", "$c >= 'e'")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        let Some(ModelValue::Char(c)) = snapshot.singleton_value("c").cloned() else {
            panic!("expected a character for c");
        };
        assert!(('e'..='f').contains(&c));
    }

    #[test]
    fn list_domain_round_trips() {
        let model = Model::builder("colours")
            .shared_domain("palette", "red, green, blue")
            .singleton_ref("left", "palette")
            .singleton_ref("right", "palette")
            .constraint("fixed", "$left = blue")
            .constraint("distinct", "$left <> $right")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        assert_eq!(
            snapshot.singleton_value("left"),
            Some(&ModelValue::Item("blue".to_string()))
        );
        assert_ne!(
            snapshot.singleton_value("left"),
            snapshot.singleton_value("right")
        );
    }

    #[test]
    fn offsets_shift_variable_comparisons() {
        let model = Model::builder("offsets")
            .singleton("a", "1..5")
            .singleton("b", "1..5")
            .constraint("stepped", "$a + 2 = $b")
            .constraint("pin", "$a = 3")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        assert_eq!(snapshot.singleton_value("a"), Some(&ModelValue::Int(3)));
        assert_eq!(snapshot.singleton_value("b"), Some(&ModelValue::Int(5)));
    }

    #[test]
    fn all_different_over_an_aggregate() {
        let model = Model::builder("permutation")
            .aggregate("p", 4, "1..4")
            .all_different("distinct", "p")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        let mut values = snapshot.aggregate_value("p").unwrap().to_vec();
        values.sort_by_key(|v| match v {
            ModelValue::Int(n) => *n,
            _ => panic!("expected integers"),
        });
        assert_eq!(
            values,
            vec![
                ModelValue::Int(1),
                ModelValue::Int(2),
                ModelValue::Int(3),
                ModelValue::Int(4)
            ]
        );
    }

    #[test]
    fn bucket_slots_are_extracted_per_member() {
        let model = Model::builder("buckets")
            .bundle("cell", [("letter", "'a'..'b'")])
            .bucket("row", 2, "cell")
            .all_different("distinct", "row")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);

        let snapshot = result.snapshot.unwrap();
        let values = snapshot.aggregate_value("row.letter").unwrap();
        assert_eq!(values.len(), 2);
        assert_ne!(values[0], values[1]);
    }

    #[test]
    fn size_bounded_expander_covers_the_aggregate() {
        let model = Model::builder("sized")
            .aggregate("cols", 4, "1..4")
            .constraint("positive", "$cols[i] >= 1 | i in size(cols)")
            .all_different("distinct", "cols")
            .build()
            .unwrap();

        let result = solve(&model);
        assert_eq!(result.status, SolveStatus::Success);
    }
}
