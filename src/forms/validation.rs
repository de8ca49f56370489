//! Field and form validation
//!
//! Validators never fail with an error: they report through a mutable
//! [`ValidationResult`], and the engine aggregates those into a
//! [`FormValidation`] report that hosts render.

use super::field::{FieldDescriptor, FieldKind, FieldValue};
use super::store::Snapshot;
use crate::config::EngineConfig;
use async_trait::async_trait;
use futures::future::join_all;
use indexmap::IndexMap;
use std::future::Future;

/// Outcome of validating one field (or a whole form, when aggregated)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error_messages: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error_messages: Vec::new(),
        }
    }

    pub fn invalid(message: &str) -> Self {
        Self {
            is_valid: false,
            error_messages: vec![message.to_string()],
        }
    }

    /// Record a failure message
    pub fn push_error(&mut self, message: &str) {
        self.is_valid = false;
        self.error_messages.push(message.to_string());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.error_messages.extend(other.error_messages);
    }
}

/// Custom validation hook attached to a field
///
/// Implementations inspect `value` (and any other field through `values`)
/// and mark `result` invalid with a message when the check fails.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn validate(&self, value: &FieldValue, result: &mut ValidationResult, values: &Snapshot);
}

/// Synchronous validator built from a closure
pub struct FnValidator<F>(F);

/// Wrap a synchronous closure as a [`Validator`]
pub fn validator_fn<F>(f: F) -> FnValidator<F>
where
    F: Fn(&FieldValue, &mut ValidationResult, &Snapshot) + Send + Sync,
{
    FnValidator(f)
}

#[async_trait]
impl<F> Validator for FnValidator<F>
where
    F: Fn(&FieldValue, &mut ValidationResult, &Snapshot) + Send + Sync,
{
    async fn validate(&self, value: &FieldValue, result: &mut ValidationResult, values: &Snapshot) {
        (self.0)(value, result, values)
    }
}

/// Asynchronous validator built from a closure returning a future
pub struct AsyncFnValidator<F>(F);

/// Wrap a future-returning closure as a [`Validator`]
pub fn async_validator_fn<F, Fut>(f: F) -> AsyncFnValidator<F>
where
    F: Fn(FieldValue, Snapshot) -> Fut + Send + Sync,
    Fut: Future<Output = ValidationResult> + Send,
{
    AsyncFnValidator(f)
}

#[async_trait]
impl<F, Fut> Validator for AsyncFnValidator<F>
where
    F: Fn(FieldValue, Snapshot) -> Fut + Send + Sync,
    Fut: Future<Output = ValidationResult> + Send,
{
    async fn validate(&self, value: &FieldValue, result: &mut ValidationResult, values: &Snapshot) {
        let outcome = (self.0)(value.clone(), values.clone()).await;
        result.merge(outcome);
    }
}

/// Validation state of one field as seen by renderers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldStatus {
    #[default]
    Unvalidated,
    /// An async validator has not resolved yet; neither pass nor fail
    Pending,
    Valid,
    Invalid(Vec<String>),
}

impl From<ValidationResult> for FieldStatus {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            FieldStatus::Valid
        } else {
            FieldStatus::Invalid(result.error_messages)
        }
    }
}

/// Ordered per-field validation report for a form instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormValidation {
    fields: IndexMap<String, FieldStatus>,
}

impl FormValidation {
    pub fn status(&self, name: &str) -> Option<&FieldStatus> {
        self.fields.get(name)
    }

    /// True only when every field has resolved as valid
    pub fn is_valid(&self) -> bool {
        self.fields
            .values()
            .all(|status| matches!(status, FieldStatus::Valid))
    }

    pub fn is_pending(&self) -> bool {
        self.fields
            .values()
            .any(|status| matches!(status, FieldStatus::Pending))
    }

    /// Error messages of a field, empty when it is not failing
    pub fn messages(&self, name: &str) -> &[String] {
        match self.fields.get(name) {
            Some(FieldStatus::Invalid(messages)) => messages,
            _ => &[],
        }
    }

    /// Failing fields with their messages, in registration order
    pub fn errors(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().filter_map(|(name, status)| match status {
            FieldStatus::Invalid(messages) => Some((name.as_str(), messages.as_slice())),
            _ => None,
        })
    }

    /// Collapse the report into a single form-level result
    pub fn result(&self) -> ValidationResult {
        ValidationResult {
            is_valid: self.is_valid(),
            error_messages: self
                .errors()
                .flat_map(|(_, messages)| messages.iter().cloned())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn set(&mut self, name: &str, status: FieldStatus) {
        self.fields.insert(name.to_string(), status);
    }

    pub(crate) fn remove(&mut self, name: &str) {
        self.fields.shift_remove(name);
    }

    /// Turn pending fields back into unvalidated ones after an abandoned pass
    pub(crate) fn clear_pending(&mut self) {
        for status in self.fields.values_mut() {
            if matches!(status, FieldStatus::Pending) {
                *status = FieldStatus::Unvalidated;
            }
        }
    }
}

/// Runs required, kind and custom checks against field values
#[derive(Debug, Clone, Default)]
pub struct ValidationEngine {
    config: EngineConfig,
}

impl ValidationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate one field against its current value
    ///
    /// A required field that is empty fails with its required message and
    /// the custom validator is not consulted. An empty optional field only
    /// answers to its custom validator.
    pub async fn validate_field(
        &self,
        descriptor: &FieldDescriptor,
        value: Option<&FieldValue>,
        all_values: &Snapshot,
    ) -> ValidationResult {
        let empty = FieldValue::default();
        let value = value.unwrap_or(&empty);

        if value.is_empty() {
            if descriptor.required {
                let message = descriptor
                    .required_message
                    .as_deref()
                    .unwrap_or_else(|| self.config.required_message());
                return ValidationResult::invalid(message);
            }
        } else if let Some(message) = self.kind_error(&descriptor.kind, value) {
            return ValidationResult::invalid(message);
        }

        let mut result = ValidationResult::valid();
        if let Some(validator) = &descriptor.validator {
            validator.validate(value, &mut result, all_values).await;
        }
        result
    }

    /// Validate every value field in registration order
    ///
    /// All async validators run concurrently and are awaited before the
    /// report is assembled.
    pub async fn validate_form(&self, fields: &[FieldDescriptor], values: &Snapshot) -> FormValidation {
        let value_fields: Vec<&FieldDescriptor> =
            fields.iter().filter(|field| field.holds_value()).collect();

        let results = join_all(
            value_fields
                .iter()
                .map(|field| self.validate_field(field, values.get(&field.name), values)),
        )
        .await;

        let mut report = FormValidation::default();
        for (field, result) in value_fields.into_iter().zip(results) {
            report.set(&field.name, result.into());
        }
        report
    }

    fn kind_error(&self, kind: &FieldKind, value: &FieldValue) -> Option<&str> {
        match (kind, value) {
            (FieldKind::Number { min, max }, FieldValue::Single(text)) => {
                let in_range = text.trim().parse::<f64>().ok().is_some_and(|n| {
                    !n.is_nan() && min.map_or(true, |min| n >= min) && max.map_or(true, |max| n <= max)
                });
                (!in_range).then(|| self.config.number_message())
            }
            (
                FieldKind::RadioGroup { options, .. } | FieldKind::Dropdown { options, .. },
                FieldValue::Single(selected),
            ) => (!options.iter().any(|o| &o.value == selected))
                .then(|| self.config.option_message()),
            (FieldKind::CheckboxGroup { options }, FieldValue::Multi(selected)) => selected
                .iter()
                .any(|item| !options.iter().any(|o| &o.value == item))
                .then(|| self.config.option_message()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::field::FieldOption;

    fn is_valid_url(value: &FieldValue, result: &mut ValidationResult, _: &Snapshot) {
        let text = value.as_text();
        if !(text.starts_with("http://") || text.starts_with("https://")) {
            result.push_error("Please enter a valid URL");
        }
    }

    fn snapshot(pairs: &[(&str, FieldValue)]) -> Snapshot {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    mod validation_result {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_default_is_valid() {
            let result = ValidationResult::default();
            assert!(result.is_valid);
            assert!(result.error_messages.is_empty());
        }

        #[test]
        fn test_push_error_invalidates() {
            let mut result = ValidationResult::valid();
            result.push_error("bad");
            assert!(!result.is_valid);
            assert_eq!(result.error_messages, vec!["bad".to_string()]);
        }

        #[test]
        fn test_merge_ands_validity() {
            let mut result = ValidationResult::valid();
            result.merge(ValidationResult::invalid("first"));
            result.merge(ValidationResult::valid());
            assert!(!result.is_valid);
            assert_eq!(result.error_messages, vec!["first".to_string()]);
        }
    }

    mod form_validation {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_empty_report_is_valid() {
            assert!(FormValidation::default().is_valid());
        }

        #[test]
        fn test_pending_field_is_not_valid() {
            let mut report = FormValidation::default();
            report.set("a", FieldStatus::Valid);
            report.set("b", FieldStatus::Pending);
            assert!(!report.is_valid());
            assert!(report.is_pending());
        }

        #[test]
        fn test_unvalidated_field_is_not_valid() {
            let mut report = FormValidation::default();
            report.set("a", FieldStatus::Unvalidated);
            assert!(!report.is_valid());
        }

        #[test]
        fn test_errors_in_order() {
            let mut report = FormValidation::default();
            report.set("b", FieldStatus::Invalid(vec!["b failed".into()]));
            report.set("a", FieldStatus::Valid);
            report.set("c", FieldStatus::Invalid(vec!["c failed".into()]));

            let errors: Vec<&str> = report.errors().map(|(name, _)| name).collect();
            assert_eq!(errors, vec!["b", "c"]);
            assert_eq!(
                report.result().error_messages,
                vec!["b failed".to_string(), "c failed".to_string()]
            );
            assert!(report.messages("a").is_empty());
        }

        #[test]
        fn test_clear_pending() {
            let mut report = FormValidation::default();
            report.set("a", FieldStatus::Pending);
            report.set("b", FieldStatus::Valid);
            report.clear_pending();
            assert_eq!(report.status("a"), Some(&FieldStatus::Unvalidated));
            assert_eq!(report.status("b"), Some(&FieldStatus::Valid));
        }
    }

    mod engine {
        use super::*;
        use pretty_assertions::assert_eq;

        #[tokio::test]
        async fn test_required_empty_uses_field_message() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::email("email", "Email").required_with("Email is required");

            let result = engine
                .validate_field(&field, Some(&FieldValue::default()), &Snapshot::default())
                .await;

            assert_eq!(result, ValidationResult::invalid("Email is required"));
        }

        #[tokio::test]
        async fn test_required_absent_uses_config_message() {
            let engine = ValidationEngine::new(EngineConfig {
                required_message: Some("Needed".into()),
                ..Default::default()
            });
            let field = FieldDescriptor::text("name", "Name").required();

            let result = engine.validate_field(&field, None, &Snapshot::default()).await;

            assert_eq!(result, ValidationResult::invalid("Needed"));
        }

        #[tokio::test]
        async fn test_required_empty_skips_custom_validator() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::text("url", "URL")
                .required_with("URL is required")
                .with_validator(validator_fn(is_valid_url));

            let result = engine
                .validate_field(&field, Some(&FieldValue::default()), &Snapshot::default())
                .await;

            assert_eq!(result.error_messages, vec!["URL is required".to_string()]);
        }

        #[tokio::test]
        async fn test_custom_validator_message_wins_over_required() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::text("url", "URL")
                .required_with("URL is required")
                .with_validator(validator_fn(is_valid_url));

            let result = engine
                .validate_field(&field, Some(&"not-a-url".into()), &Snapshot::default())
                .await;

            assert!(!result.is_valid);
            assert_eq!(
                result.error_messages,
                vec!["Please enter a valid URL".to_string()]
            );
        }

        #[tokio::test]
        async fn test_optional_empty_is_valid() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::number("age", "Age", Some(0.0), None);

            let result = engine
                .validate_field(&field, Some(&FieldValue::default()), &Snapshot::default())
                .await;

            assert!(result.is_valid);
        }

        #[tokio::test]
        async fn test_optional_empty_still_consults_validator() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::text("nickname", "Nickname").with_validator(validator_fn(
                |value: &FieldValue, result: &mut ValidationResult, _: &Snapshot| {
                    if value.is_empty() {
                        result.push_error("Pick a nickname");
                    }
                },
            ));

            let result = engine.validate_field(&field, None, &Snapshot::default()).await;

            assert_eq!(result, ValidationResult::invalid("Pick a nickname"));
        }

        #[tokio::test]
        async fn test_number_bounds() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::number("port", "Port", Some(1.0), Some(65535.0));
            let values = Snapshot::default();

            assert!(engine.validate_field(&field, Some(&"443".into()), &values).await.is_valid);
            assert!(!engine.validate_field(&field, Some(&"0".into()), &values).await.is_valid);
            assert!(!engine.validate_field(&field, Some(&"abc".into()), &values).await.is_valid);
        }

        #[tokio::test]
        async fn test_option_membership() {
            let engine = ValidationEngine::default();
            let options = vec![FieldOption::new("A", "a"), FieldOption::new("B", "b")];
            let dropdown = FieldDescriptor::dropdown("d", "D", options.clone());
            let checkboxes = FieldDescriptor::checkbox_group("c", "C", options);
            let values = Snapshot::default();

            assert!(engine.validate_field(&dropdown, Some(&"a".into()), &values).await.is_valid);
            assert!(!engine.validate_field(&dropdown, Some(&"z".into()), &values).await.is_valid);
            assert!(
                !engine
                    .validate_field(&checkboxes, Some(&vec!["a", "z"].into()), &values)
                    .await
                    .is_valid
            );
        }

        #[tokio::test]
        async fn test_validator_sees_all_values() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::password("confirm", "Confirm").with_validator(validator_fn(
                |value: &FieldValue, result: &mut ValidationResult, values: &Snapshot| {
                    if values.get("password") != Some(value) {
                        result.push_error("Passwords do not match");
                    }
                },
            ));
            let values = snapshot(&[
                ("password", "secret".into()),
                ("confirm", "secrat".into()),
            ]);

            let result = engine
                .validate_field(&field, values.get("confirm"), &values)
                .await;

            assert_eq!(result, ValidationResult::invalid("Passwords do not match"));
        }

        #[tokio::test]
        async fn test_async_validator() {
            let engine = ValidationEngine::default();
            let field = FieldDescriptor::text("username", "Username").with_validator(
                async_validator_fn(|value: FieldValue, _: Snapshot| async move {
                    tokio::task::yield_now().await;
                    if value.as_text() == "admin" {
                        ValidationResult::invalid("Username is taken")
                    } else {
                        ValidationResult::valid()
                    }
                }),
            );
            let values = Snapshot::default();

            assert!(engine.validate_field(&field, Some(&"alice".into()), &values).await.is_valid);
            assert_eq!(
                engine.validate_field(&field, Some(&"admin".into()), &values).await,
                ValidationResult::invalid("Username is taken")
            );
        }

        #[tokio::test]
        async fn test_validate_form_reports_required_field() {
            let engine = ValidationEngine::default();
            let fields = vec![
                FieldDescriptor::text("name", "Name").required_with("Name is required"),
                FieldDescriptor::text("url", "URL")
                    .required_with("URL is required")
                    .with_validator(validator_fn(is_valid_url)),
                FieldDescriptor::submit_button("submit", "Submit"),
            ];
            let values = snapshot(&[
                ("name", FieldValue::default()),
                ("url", "https://example.com".into()),
            ]);

            let report = engine.validate_form(&fields, &values).await;

            assert!(!report.is_valid());
            assert_eq!(report.len(), 2);
            assert_eq!(report.messages("name"), ["Name is required".to_string()]);
            assert_eq!(report.status("url"), Some(&FieldStatus::Valid));
            assert!(report.status("submit").is_none());
        }

        #[tokio::test]
        async fn test_validate_form_all_valid() {
            let engine = ValidationEngine::default();
            let fields = vec![
                FieldDescriptor::text("name", "Name").required(),
                FieldDescriptor::textarea("notes", "Notes"),
            ];
            let values = snapshot(&[("name", "Ada".into()), ("notes", FieldValue::default())]);

            let report = engine.validate_form(&fields, &values).await;

            assert!(report.is_valid());
            assert!(report.result().error_messages.is_empty());
        }
    }
}
