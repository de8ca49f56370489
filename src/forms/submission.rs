//! Submission state machine and the external submit contract

use super::store::Snapshot;
use super::validation::FormValidation;
use async_trait::async_trait;
use std::future::Future;

/// Where a submission request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A submit button or key press in the form itself
    User,
    /// A programmatic request, e.g. a wizard's Next button
    External,
}

/// Phase of the single in-flight submission a form may have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Validating,
    Submitting,
}

/// Result of a submission request
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Validation passed and the handler accepted these values
    Submitted(Snapshot),
    /// Validation failed; the handler was not called
    Rejected(FormValidation),
    /// Another submission was already in flight
    Ignored,
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// Receiver of validated form values, e.g. a backend API call
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    async fn submit(&self, values: Snapshot) -> anyhow::Result<()>;
}

/// Submit handler built from a closure returning a future
pub struct SubmitFn<F>(F);

/// Wrap a future-returning closure as a [`SubmitHandler`]
pub fn submit_fn<F, Fut>(f: F) -> SubmitFn<F>
where
    F: Fn(Snapshot) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    SubmitFn(f)
}

#[async_trait]
impl<F, Fut> SubmitHandler for SubmitFn<F>
where
    F: Fn(Snapshot) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn submit(&self, values: Snapshot) -> anyhow::Result<()> {
        (self.0)(values).await
    }
}

/// Tracks the submission phase; at most one submission is in flight
#[derive(Debug, Clone, Default)]
pub struct SubmissionController {
    state: SubmitState,
}

impl SubmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubmitState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SubmitState::Idle
    }

    /// Idle -> Validating; false when a submission is already in flight
    pub fn begin(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.state = SubmitState::Validating;
        true
    }

    /// Validating -> Submitting on success, back to Idle on rejection
    pub fn validated(&mut self, is_valid: bool) {
        if self.state != SubmitState::Validating {
            return;
        }
        self.state = if is_valid {
            SubmitState::Submitting
        } else {
            SubmitState::Idle
        };
    }

    /// Any phase -> Idle
    pub fn finish(&mut self) {
        self.state = SubmitState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let controller = SubmissionController::new();
        assert_eq!(controller.state(), SubmitState::Idle);
    }

    #[test]
    fn test_begin_only_from_idle() {
        let mut controller = SubmissionController::new();
        assert!(controller.begin());
        assert_eq!(controller.state(), SubmitState::Validating);
        assert!(!controller.begin());

        controller.validated(true);
        assert_eq!(controller.state(), SubmitState::Submitting);
        assert!(!controller.begin());
    }

    #[test]
    fn test_rejection_returns_to_idle() {
        let mut controller = SubmissionController::new();
        controller.begin();
        controller.validated(false);
        assert!(controller.is_idle());
    }

    #[test]
    fn test_validated_outside_validating_is_noop() {
        let mut controller = SubmissionController::new();
        controller.validated(true);
        assert!(controller.is_idle());
    }

    #[test]
    fn test_finish_resets() {
        let mut controller = SubmissionController::new();
        controller.begin();
        controller.validated(true);
        controller.finish();
        assert!(controller.is_idle());
        assert!(controller.begin());
    }

    #[test]
    fn test_outcome_is_submitted() {
        assert!(SubmitOutcome::Submitted(Snapshot::default()).is_submitted());
        assert!(!SubmitOutcome::Ignored.is_submitted());
    }

    #[tokio::test]
    async fn test_submit_fn_forwards_values() {
        let handler = submit_fn(|values: Snapshot| async move {
            anyhow::ensure!(values.is_empty(), "expected no values");
            anyhow::Ok(())
        });
        assert!(handler.submit(Snapshot::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_handler() {
        let mut handler = MockSubmitHandler::new();
        handler
            .expect_submit()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("rejected by server")));

        let err = handler.submit(Snapshot::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "rejected by server");
    }
}
