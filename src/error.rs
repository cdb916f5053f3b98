pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors that can abort a solve after the model has passed validation.
///
/// These are distinct from validation failures, which are accumulated into a
/// [`ValidationContext`](crate::model::validation::ValidationContext) and
/// reported as an `InvalidModel` result rather than an `Err`. Everything here
/// is either bad expansion text (`Parse`) or a defect-level condition that a
/// validated model should never produce.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A constraint or domain expression could not be parsed. Also raised
    /// when a repeater's substituted template text fails to re-parse.
    #[error("parse error in {text:?}: {message}")]
    Parse { text: String, message: String },

    /// A model-level value fell outside its variable's declared domain.
    /// Unreachable for a validated model with correctly sized variables;
    /// fail fast rather than clamp.
    #[error("value {value} is outside the domain of variable {variable}")]
    DomainMapping { variable: String, value: String },

    /// The converter met an AST shape it does not recognize. Signals a
    /// grammar/converter mismatch, not bad user input.
    #[error("unsupported construct: {0}")]
    UnsupportedConstruct(String),

    /// A name lookup failed during conversion. Validation should have caught
    /// the reference, so reaching this is a defect.
    #[error("unknown variable {0:?}")]
    UnknownVariable(String),

    /// A subscript resolved outside the bounds of an aggregate.
    #[error("subscript {index} is out of bounds for {variable:?} (size {size})")]
    SubscriptOutOfBounds {
        variable: String,
        index: i64,
        size: usize,
    },
}

impl Error {
    pub(crate) fn parse(text: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            text: text.into(),
            message: message.into(),
        }
    }
}
