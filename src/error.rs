//! Error taxonomy for the form engine
//!
//! Validation failures are never errors: they are reported as data through
//! [`crate::forms::FormValidation`]. Everything here is either a bug in the
//! embedding code or a failure surfaced by an external submit handler.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which suspension point a timeout fired at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validation,
    Submission,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Validation => f.write_str("validation"),
            Stage::Submission => f.write_str("submission"),
        }
    }
}

/// Errors returned by form instances and wizards
#[derive(Debug, Error)]
pub enum FormError {
    #[error("field already registered: {0}")]
    DuplicateField(String),

    #[error("field not registered: {0}")]
    UnknownField(String),

    #[error("field does not hold a value: {0}")]
    NotAValueField(String),

    #[error("value shape does not match field kind for '{name}': expected {expected}")]
    ValueShape { name: String, expected: &'static str },

    #[error("invalid field descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("wizard has no steps")]
    EmptyWizard,

    #[error("wizard is no longer active")]
    WizardClosed,

    /// The submit handler (or wizard consumer) failed; the original error is kept intact.
    #[error("submission failed: {0}")]
    Submission(#[source] anyhow::Error),

    #[error("{stage} timed out after {}ms", .after.as_millis())]
    Timeout { stage: Stage, after: Duration },
}

impl FormError {
    /// True for errors that indicate a bug in the embedding code
    pub fn is_programmer_error(&self) -> bool {
        !matches!(self, FormError::Submission(_) | FormError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_duplicate_field() {
        let err = FormError::DuplicateField("email".to_string());
        assert_eq!(err.to_string(), "field already registered: email");
    }

    #[test]
    fn test_display_timeout() {
        let err = FormError::Timeout {
            stage: Stage::Submission,
            after: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "submission timed out after 250ms");
    }

    #[test]
    fn test_submission_keeps_source() {
        let err = FormError::Submission(anyhow::anyhow!("backend said no"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("backend said no"));
    }

    #[test]
    fn test_programmer_error_classification() {
        assert!(FormError::EmptyWizard.is_programmer_error());
        assert!(FormError::UnknownField("x".into()).is_programmer_error());
        assert!(!FormError::Submission(anyhow::anyhow!("x")).is_programmer_error());
        assert!(!FormError::Timeout {
            stage: Stage::Validation,
            after: Duration::from_secs(1)
        }
        .is_programmer_error());
    }
}
