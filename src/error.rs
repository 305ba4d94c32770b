//! Crate error type.

use thiserror::Error;

/// Crate specific Errors implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleError {
    /// A single specification field failed structural or range validation.
    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the violated constraint.
        reason: String,
    },
    /// Cross-field contradiction in the specification.
    #[error("conflicting specification: {0}")]
    SemanticConflict(String),
    /// An exhaustive result was requested from a rule with neither an end
    /// date nor a repeat count.
    #[error("rule is unbounded: a batch cap is required to compute occurrences")]
    UnboundedQuery,
}

impl RuleError {
    pub(crate) fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(reason: impl Into<String>) -> Self {
        Self::SemanticConflict(reason.into())
    }
}
