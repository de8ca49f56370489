//! Form instances: one isolated registry, value store and submission controller
//!
//! A [`FormInstance`] is a cheap, cloneable handle. Field components receive a
//! clone and register themselves on mount, write their values through it and
//! unregister on unmount, while the host drives submission. Internal state sits
//! behind a mutex that is never held across an await point, so fields can
//! unmount while a validator or submit handler is still pending.

use super::field::{FieldDescriptor, FieldValue};
use super::registry::FieldRegistry;
use super::store::{Snapshot, ValueStore};
use super::submission::{SubmissionController, SubmitHandler, SubmitOutcome, SubmitState, Trigger};
use super::validation::{FieldStatus, FormValidation, ValidationEngine};
use crate::config::EngineConfig;
use crate::error::{FormError, Stage};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;

/// Callback fired with the current values after every value change
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Default)]
struct FormInner {
    registry: FieldRegistry,
    store: ValueStore,
    controller: SubmissionController,
    /// Bumped whenever a submission or reset takes over the published report
    report_epoch: u64,
}

struct Shared {
    name: String,
    inner: Mutex<FormInner>,
    listeners: Mutex<Vec<Listener>>,
    engine: ValidationEngine,
    handler: Option<Arc<dyn SubmitHandler>>,
    validation_timeout: Option<Duration>,
    submit_timeout: Option<Duration>,
    report: watch::Sender<FormValidation>,
    state: watch::Sender<SubmitState>,
}

/// Handle to one isolated form
#[derive(Clone)]
pub struct FormInstance {
    shared: Arc<Shared>,
}

/// Non-owning handle, for listeners that write back into their own form
#[derive(Clone)]
pub struct WeakFormInstance {
    shared: Weak<Shared>,
}

impl WeakFormInstance {
    pub fn upgrade(&self) -> Option<FormInstance> {
        self.shared.upgrade().map(|shared| FormInstance { shared })
    }
}

/// Builder for [`FormInstance`]
pub struct FormBuilder {
    name: String,
    config: EngineConfig,
    handler: Option<Arc<dyn SubmitHandler>>,
    fields: Vec<FieldDescriptor>,
}

impl FormBuilder {
    pub fn config(mut self, config: &EngineConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn on_submit(mut self, handler: impl SubmitHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Share an existing handler between forms
    pub fn on_submit_shared(mut self, handler: Arc<dyn SubmitHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Queue a field to be registered when the form is built
    pub fn field(mut self, descriptor: FieldDescriptor) -> Self {
        self.fields.push(descriptor);
        self
    }

    pub fn build(mut self) -> Result<FormInstance, FormError> {
        let fields = std::mem::take(&mut self.fields);
        let form = FormInstance {
            shared: self.build_shared(),
        };
        for descriptor in fields {
            form.register_field(descriptor)?;
        }
        Ok(form)
    }

    fn build_shared(self) -> Arc<Shared> {
        let (report, _) = watch::channel(FormValidation::default());
        let (state, _) = watch::channel(SubmitState::Idle);
        Arc::new(Shared {
            name: self.name,
            inner: Mutex::new(FormInner::default()),
            listeners: Mutex::new(Vec::new()),
            validation_timeout: self.config.validation_timeout(),
            submit_timeout: self.config.submit_timeout(),
            engine: ValidationEngine::new(self.config),
            handler: self.handler,
            report,
            state,
        })
    }
}

/// Resets the controller when a submission ends, however it ends
struct InFlight<'a> {
    form: &'a FormInstance,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.form.lock().controller.finish();
        self.form.shared.report.send_modify(FormValidation::clear_pending);
        self.form.publish_state(SubmitState::Idle);
    }
}

impl FormInstance {
    pub fn builder(name: &str) -> FormBuilder {
        FormBuilder {
            name: name.to_string(),
            config: EngineConfig::default(),
            handler: None,
            fields: Vec::new(),
        }
    }

    /// Empty form with default configuration and no submit handler
    pub fn new(name: &str) -> Self {
        Self {
            shared: Self::builder(name).build_shared(),
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn downgrade(&self) -> WeakFormInstance {
        WeakFormInstance {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Mount a field
    pub fn register_field(&self, descriptor: FieldDescriptor) -> Result<(), FormError> {
        let name = descriptor.name.clone();
        let seed = descriptor.seed_value();
        {
            let mut inner = self.lock();
            inner.registry.register(descriptor)?;
            if let Some(value) = seed {
                inner.store.seed(&name, value);
            }
        }
        tracing::debug!("form {}: registered field {}", self.name(), name);
        Ok(())
    }

    /// Unmount a field, dropping its value and any reported status; idempotent
    pub fn unregister_field(&self, name: &str) {
        let removed = {
            let mut inner = self.lock();
            inner.store.remove(name);
            inner.registry.unregister(name).is_some()
        };
        if removed {
            self.shared.report.send_modify(|report| report.remove(name));
            tracing::debug!("form {}: unregistered field {}", self.name(), name);
        }
    }

    pub fn fields(&self) -> Vec<FieldDescriptor> {
        self.lock().registry.list().into_iter().cloned().collect()
    }

    pub fn field(&self, name: &str) -> Option<FieldDescriptor> {
        self.lock().registry.get(name).cloned()
    }

    /// Evaluate a field's disabled predicate against the current values
    ///
    /// Unknown fields and fields without a predicate are enabled.
    pub fn is_disabled(&self, name: &str) -> bool {
        let (field, values) = {
            let inner = self.lock();
            match inner.registry.get(name) {
                Some(field) => (field.clone(), inner.store.snapshot()),
                None => return false,
            }
        };
        field.is_disabled(&values)
    }

    pub fn set_value(&self, name: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        let snapshot = {
            let mut inner = self.lock();
            let FormInner { registry, store, .. } = &mut *inner;
            store.set_value(registry, name, value.into())?;
            store.snapshot()
        };
        self.notify(&snapshot);
        Ok(())
    }

    pub fn get_value(&self, name: &str) -> Option<FieldValue> {
        self.lock().store.get_value(name).cloned()
    }

    /// Apply several values at once; listeners see only the final state
    pub fn merge(&self, partial: &Snapshot) -> Result<(), FormError> {
        let snapshot = {
            let mut inner = self.lock();
            let FormInner { registry, store, .. } = &mut *inner;
            store.merge(registry, partial)?;
            store.snapshot()
        };
        self.notify(&snapshot);
        Ok(())
    }

    /// Select or deselect one option of a checkbox group
    pub fn toggle(&self, name: &str, option: &str) -> Result<(), FormError> {
        let current = self
            .get_value(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let FieldValue::Multi(mut selected) = current else {
            return Err(FormError::ValueShape {
                name: name.to_string(),
                expected: "a list of values",
            });
        };
        match selected.iter().position(|item| item == option) {
            Some(index) => {
                selected.remove(index);
            }
            None => selected.push(option.to_string()),
        }
        self.set_value(name, FieldValue::Multi(selected))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().store.snapshot()
    }

    /// Register a callback fired after every value change
    ///
    /// Listeners run outside the form's lock and may write back into the
    /// form; hold a [`WeakFormInstance`] to do so without a reference cycle.
    pub fn listen(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) {
        self.shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub fn submit_state(&self) -> SubmitState {
        self.lock().controller.state()
    }

    /// Latest published validation report
    pub fn validation(&self) -> FormValidation {
        self.shared.report.borrow().clone()
    }

    pub fn subscribe_errors(&self) -> watch::Receiver<FormValidation> {
        self.shared.report.subscribe()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SubmitState> {
        self.shared.state.subscribe()
    }

    /// Validate a single field, e.g. when it loses focus
    ///
    /// Returns `Unvalidated` when the field was unmounted while its validator
    /// was running; that result is discarded. The status is computed but not
    /// published when a submission or reset owns the report.
    pub async fn validate_one(&self, name: &str) -> Result<FieldStatus, FormError> {
        let (descriptor, generation, epoch, idle, values) = {
            let inner = self.lock();
            let descriptor = inner
                .registry
                .get(name)
                .cloned()
                .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
            if !descriptor.holds_value() {
                return Err(FormError::NotAValueField(name.to_string()));
            }
            let generation = inner.registry.generation(name).unwrap_or_default();
            let idle = inner.controller.is_idle();
            if idle {
                self.shared
                    .report
                    .send_modify(|report| report.set(name, FieldStatus::Pending));
            }
            (
                descriptor,
                generation,
                inner.report_epoch,
                idle,
                inner.store.snapshot(),
            )
        };

        let result = self
            .shared
            .engine
            .validate_field(&descriptor, values.get(name), &values)
            .await;

        let status = FieldStatus::from(result);
        let inner = self.lock();
        if inner.registry.generation(name) != Some(generation) {
            tracing::warn!(
                "form {}: discarding stale validation for {}",
                self.name(),
                name
            );
            return Ok(FieldStatus::Unvalidated);
        }
        if !idle || !inner.controller.is_idle() || inner.report_epoch != epoch {
            tracing::debug!(
                "form {}: not publishing {} status, report superseded",
                self.name(),
                name
            );
            return Ok(status);
        }
        self.shared
            .report
            .send_modify(|report| report.set(name, status.clone()));
        Ok(status)
    }

    /// Validate every field and, when all pass, hand the values to the submit handler
    ///
    /// User-initiated and external triggers take the same path. A request made
    /// while another submission is in flight returns [`SubmitOutcome::Ignored`].
    pub async fn request_submit(&self, trigger: Trigger) -> Result<SubmitOutcome, FormError> {
        let (jobs, values) = {
            let mut inner = self.lock();
            if !inner.controller.begin() {
                tracing::debug!(
                    "form {}: {:?} submit ignored, submission in flight",
                    self.name(),
                    trigger
                );
                return Ok(SubmitOutcome::Ignored);
            }
            inner.report_epoch += 1;
            (inner.registry.mounted_values(), inner.store.snapshot())
        };
        let _in_flight = InFlight { form: self };
        self.publish_state(SubmitState::Validating);
        tracing::debug!("form {}: validating ({:?} trigger)", self.name(), trigger);

        self.shared.report.send_modify(|report| {
            for (field, _) in &jobs {
                report.set(&field.name, FieldStatus::Pending);
            }
        });

        let descriptors: Vec<FieldDescriptor> =
            jobs.iter().map(|(field, _)| field.clone()).collect();
        let validation = self.shared.engine.validate_form(&descriptors, &values);
        let report = match with_timeout(self.shared.validation_timeout, Stage::Validation, validation).await
        {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!("form {}: {}", self.name(), err);
                return Err(err);
            }
        };

        // Drop results and values of fields unmounted while validation was pending
        let (report, submitted) = {
            let mut inner = self.lock();
            let mut live = FormValidation::default();
            let mut submitted = Vec::new();
            for (field, generation) in &jobs {
                if inner.registry.generation(&field.name) != Some(*generation) {
                    tracing::warn!(
                        "form {}: discarding stale validation for {}",
                        self.name(),
                        field.name
                    );
                    continue;
                }
                if let Some(status) = report.status(&field.name) {
                    live.set(&field.name, status.clone());
                }
                if let Some(value) = values.get(&field.name) {
                    submitted.push((field.name.clone(), value.clone()));
                }
            }
            inner.controller.validated(live.is_valid());
            (live, submitted.into_iter().collect::<Snapshot>())
        };

        self.shared.report.send_modify(|published| {
            for (field, _) in &jobs {
                if let Some(status) = report.status(&field.name) {
                    published.set(&field.name, status.clone());
                }
            }
        });

        if !report.is_valid() {
            tracing::debug!(
                "form {}: rejected with {} failing field(s)",
                self.name(),
                report.errors().count()
            );
            return Ok(SubmitOutcome::Rejected(report));
        }

        self.publish_state(SubmitState::Submitting);
        if let Some(handler) = &self.shared.handler {
            let submission = handler.submit(submitted.clone());
            match with_timeout(self.shared.submit_timeout, Stage::Submission, submission).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!("form {}: submit handler failed: {}", self.name(), err);
                    return Err(FormError::Submission(err));
                }
                Err(err) => {
                    tracing::warn!("form {}: {}", self.name(), err);
                    return Err(err);
                }
            }
        }

        tracing::info!(
            "form {}: submitted {} value(s)",
            self.name(),
            submitted.len()
        );
        Ok(SubmitOutcome::Submitted(submitted))
    }

    /// Restore every value field to its kind default and clear reported errors
    ///
    /// Returns false, doing nothing, while a submission is in flight.
    pub fn reset(&self) -> bool {
        let snapshot = {
            let mut inner = self.lock();
            if !inner.controller.is_idle() {
                return false;
            }
            inner.report_epoch += 1;
            let FormInner { registry, store, .. } = &mut *inner;
            store.reset(registry);
            let mut cleared = FormValidation::default();
            for (field, _) in registry.mounted_values() {
                cleared.set(&field.name, FieldStatus::Unvalidated);
            }
            self.shared.report.send_replace(cleared);
            store.snapshot()
        };
        tracing::debug!("form {}: reset", self.name());
        self.notify(&snapshot);
        true
    }

    fn lock(&self) -> MutexGuard<'_, FormInner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_state(&self, state: SubmitState) {
        self.shared.state.send_replace(state);
    }

    fn notify(&self, snapshot: &Snapshot) {
        let listeners: Vec<Listener> = self
            .shared
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(snapshot);
        }
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    stage: Stage,
    future: impl Future<Output = T>,
) -> Result<T, FormError> {
    match limit {
        Some(after) => tokio::time::timeout(after, future)
            .await
            .map_err(|_| FormError::Timeout { stage, after }),
        None => Ok(future.await),
    }
}
