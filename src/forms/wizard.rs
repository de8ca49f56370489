//! Multi-step wizards composed of independent form instances
//!
//! Each step owns its own [`FormInstance`]. Advancing submits the current
//! step externally; only snapshots of steps that were successfully advanced
//! past end up in the accumulated state.

use super::form::FormInstance;
use super::store::Snapshot;
use super::submission::{SubmitOutcome, Trigger};
use super::validation::FormValidation;
use crate::error::FormError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

/// One page of a wizard
#[derive(Clone)]
pub struct WizardStep {
    pub name: String,
    pub title: String,
    pub form: FormInstance,
}

impl WizardStep {
    pub fn new(name: &str, title: &str, form: FormInstance) -> Self {
        Self {
            name: name.to_string(),
            title: title.to_string(),
            form,
        }
    }
}

/// Where the wizard is, as published to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStatus {
    Active { step: usize, total: usize },
    Finished,
    Cancelled,
}

/// Result of one `advance` call
#[derive(Debug, Clone, PartialEq)]
pub enum WizardProgress {
    /// Moved to the step at this index
    Advanced { step: usize },
    /// The current step failed validation
    Stayed(FormValidation),
    /// The last step passed; this is the merged result
    Finished(Snapshot),
    /// The current step was already submitting
    Ignored,
}

/// Receives the outcome of a wizard
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WizardConsumer: Send + Sync {
    async fn finished(&self, result: Snapshot) -> anyhow::Result<()>;
    fn cancelled(&self);
}

/// Drives a linear sequence of step forms and accumulates their values
pub struct WizardCoordinator {
    steps: Vec<WizardStep>,
    current: usize,
    /// Snapshot each step had when it was last advanced past
    results: Vec<Option<Snapshot>>,
    status: WizardStatus,
    consumer: Option<Arc<dyn WizardConsumer>>,
    updates: watch::Sender<WizardStatus>,
}

impl WizardCoordinator {
    pub fn new(steps: Vec<WizardStep>) -> Self {
        let status = WizardStatus::Active {
            step: 0,
            total: steps.len(),
        };
        let (updates, _) = watch::channel(status);
        Self {
            results: vec![None; steps.len()],
            steps,
            current: 0,
            status,
            consumer: None,
            updates,
        }
    }

    pub fn with_consumer(mut self, consumer: impl WizardConsumer + 'static) -> Self {
        self.consumer = Some(Arc::new(consumer));
        self
    }

    /// Append a step
    pub fn step(mut self, step: WizardStep) -> Self {
        self.steps.push(step);
        self.results.push(None);
        if self.is_active() {
            self.set_status(WizardStatus::Active {
                step: self.current,
                total: self.steps.len(),
            });
        }
        self
    }

    /// Submit the current step and move forward when it passes
    ///
    /// On the last step the merged state goes to the consumer. If the
    /// consumer fails the wizard stays on the last step and the last
    /// step's values are not committed.
    pub async fn advance(&mut self) -> Result<WizardProgress, FormError> {
        if self.steps.is_empty() {
            return Err(FormError::EmptyWizard);
        }
        if !self.is_active() {
            return Err(FormError::WizardClosed);
        }

        let form = self.steps[self.current].form.clone();
        let values = match form.request_submit(Trigger::External).await? {
            SubmitOutcome::Submitted(values) => values,
            SubmitOutcome::Rejected(report) => {
                tracing::debug!(
                    "wizard: step {} rejected with {} failing field(s)",
                    self.current,
                    report.errors().count()
                );
                return Ok(WizardProgress::Stayed(report));
            }
            SubmitOutcome::Ignored => return Ok(WizardProgress::Ignored),
        };

        if self.current + 1 < self.steps.len() {
            self.results[self.current] = Some(values);
            self.current += 1;
            self.set_status(WizardStatus::Active {
                step: self.current,
                total: self.steps.len(),
            });
            tracing::debug!("wizard: advanced to step {}", self.current);
            return Ok(WizardProgress::Advanced { step: self.current });
        }

        let mut result = self.merged(self.current);
        result.merge_from(&values);
        if let Some(consumer) = &self.consumer {
            if let Err(err) = consumer.finished(result.clone()).await {
                tracing::warn!("wizard: consumer rejected result: {}", err);
                return Err(FormError::Submission(err));
            }
        }

        self.results[self.current] = Some(values);
        self.set_status(WizardStatus::Finished);
        tracing::info!("wizard: finished with {} value(s)", result.len());
        Ok(WizardProgress::Finished(result))
    }

    /// Go back one step without validating or clearing anything
    pub fn retreat(&mut self) -> Result<usize, FormError> {
        if !self.is_active() {
            return Err(FormError::WizardClosed);
        }
        if self.current > 0 {
            self.current -= 1;
            self.set_status(WizardStatus::Active {
                step: self.current,
                total: self.steps.len(),
            });
            tracing::debug!("wizard: back to step {}", self.current);
        }
        Ok(self.current)
    }

    /// Abandon the wizard, discarding accumulated values
    pub fn cancel(&mut self) -> Result<(), FormError> {
        if !self.is_active() {
            return Err(FormError::WizardClosed);
        }
        self.results.iter_mut().for_each(|slot| *slot = None);
        self.set_status(WizardStatus::Cancelled);
        if let Some(consumer) = &self.consumer {
            consumer.cancelled();
        }
        tracing::info!("wizard: cancelled");
        Ok(())
    }

    /// Values accumulated from the steps advanced past so far
    ///
    /// Each step contributes the snapshot from its latest advance; later
    /// steps override earlier ones on colliding names.
    pub fn state(&self) -> Snapshot {
        self.merged(self.results.len())
    }

    pub fn status(&self) -> WizardStatus {
        self.status
    }

    pub fn subscribe(&self) -> watch::Receiver<WizardStatus> {
        self.updates.subscribe()
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, WizardStatus::Active { .. })
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&WizardStep> {
        self.steps.get(self.current)
    }

    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Merge the recorded snapshots of the steps before `end`, in step order
    fn merged(&self, end: usize) -> Snapshot {
        let mut merged = Snapshot::default();
        for values in self.results[..end].iter().flatten() {
            merged.merge_from(values);
        }
        merged
    }

    fn set_status(&mut self, status: WizardStatus) {
        self.status = status;
        self.updates.send_replace(status);
    }
}
