//! Form field value objects and descriptors

use super::store::Snapshot;
use super::validation::Validator;
use crate::error::FormError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Value held by a field: a single string or an ordered list for multi-valued kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Single(String::new())
    }
}

impl FieldValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Single(s) => s.is_empty(),
            FieldValue::Multi(items) => items.is_empty(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FieldValue::Multi(_))
    }

    /// Get the text value (returns empty string for multi values)
    pub fn as_text(&self) -> &str {
        match self {
            FieldValue::Single(s) => s,
            FieldValue::Multi(_) => "",
        }
    }

    /// Get the selected items (returns an empty slice for single values)
    pub fn as_list(&self) -> &[String] {
        match self {
            FieldValue::Single(_) => &[],
            FieldValue::Multi(items) => items,
        }
    }

    /// Get the display value for rendering
    pub fn display_value(&self) -> String {
        match self {
            FieldValue::Single(s) => s.clone(),
            FieldValue::Multi(items) => items.join(", "),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::Multi(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(value: Vec<&str>) -> Self {
        FieldValue::Multi(value.into_iter().map(str::to_string).collect())
    }
}

/// A selectable choice of a checkbox group, radio group or dropdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOption {
    pub label: String,
    pub value: String,
}

impl FieldOption {
    pub fn new(label: &str, value: &str) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// Closed set of field kinds, each with the payload it needs
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    Password,
    Textarea,
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    CheckboxGroup {
        options: Vec<FieldOption>,
    },
    RadioGroup {
        options: Vec<FieldOption>,
        default: Option<String>,
    },
    Dropdown {
        options: Vec<FieldOption>,
        default: Option<String>,
    },
    Custom,
    SubmitButton {
        label: String,
    },
    ResetButton {
        label: String,
    },
    /// Host-handled action, e.g. "Add attribute"
    Button {
        label: String,
    },
    Divider,
}

impl FieldKind {
    /// Buttons and dividers take part in ordering but never hold a value
    pub fn holds_value(&self) -> bool {
        !matches!(
            self,
            FieldKind::SubmitButton { .. }
                | FieldKind::ResetButton { .. }
                | FieldKind::Button { .. }
                | FieldKind::Divider
        )
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FieldKind::CheckboxGroup { .. })
    }

    /// Free-text kinds edited character by character
    pub fn is_text_input(&self) -> bool {
        matches!(
            self,
            FieldKind::Text
                | FieldKind::Email
                | FieldKind::Password
                | FieldKind::Textarea
                | FieldKind::Number { .. }
                | FieldKind::Custom
        )
    }

    pub fn options(&self) -> Option<&[FieldOption]> {
        match self {
            FieldKind::CheckboxGroup { options }
            | FieldKind::RadioGroup { options, .. }
            | FieldKind::Dropdown { options, .. } => Some(options),
            _ => None,
        }
    }

    /// Value a field of this kind holds before any input, and after a reset
    pub fn default_value(&self) -> Option<FieldValue> {
        match self {
            _ if !self.holds_value() => None,
            FieldKind::CheckboxGroup { .. } => Some(FieldValue::Multi(Vec::new())),
            FieldKind::RadioGroup { default, .. } | FieldKind::Dropdown { default, .. } => {
                Some(FieldValue::Single(default.clone().unwrap_or_default()))
            }
            _ => Some(FieldValue::default()),
        }
    }

    pub fn expected_shape(&self) -> &'static str {
        if self.is_multi() {
            "a list of values"
        } else {
            "a single value"
        }
    }

    /// Whether `value` has the shape this kind stores
    pub fn accepts_shape(&self, value: &FieldValue) -> bool {
        self.is_multi() == value.is_multi()
    }

    fn has_option(&self, value: &str) -> bool {
        self.options()
            .is_some_and(|options| options.iter().any(|o| o.value == value))
    }
}

/// Predicate over the current values deciding whether a field is disabled
pub type DisabledWhen = Arc<dyn Fn(&Snapshot) -> bool + Send + Sync>;

/// Represents a single declared form field
#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Falls back to the engine's configured message when unset
    pub required_message: Option<String>,
    pub placeholder: Option<String>,
    pub initial_value: Option<FieldValue>,
    pub validator: Option<Arc<dyn Validator>>,
    pub disabled: Option<DisabledWhen>,
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("required_message", &self.required_message)
            .field("placeholder", &self.placeholder)
            .field("initial_value", &self.initial_value)
            .field("has_validator", &self.validator.is_some())
            .field("has_disabled", &self.disabled.is_some())
            .finish()
    }
}

impl FieldDescriptor {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            required_message: None,
            placeholder: None,
            initial_value: None,
            validator: None,
            disabled: None,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn email(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub fn password(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Password)
    }

    pub fn textarea(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Textarea)
    }

    pub fn number(name: &str, label: &str, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(name, label, FieldKind::Number { min, max })
    }

    pub fn checkbox_group(name: &str, label: &str, options: Vec<FieldOption>) -> Self {
        Self::new(name, label, FieldKind::CheckboxGroup { options })
    }

    pub fn radio_group(name: &str, label: &str, options: Vec<FieldOption>) -> Self {
        Self::new(
            name,
            label,
            FieldKind::RadioGroup {
                options,
                default: None,
            },
        )
    }

    pub fn dropdown(name: &str, label: &str, options: Vec<FieldOption>) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Dropdown {
                options,
                default: None,
            },
        )
    }

    pub fn custom(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Custom)
    }

    pub fn submit_button(name: &str, label: &str) -> Self {
        Self::new(
            name,
            label,
            FieldKind::SubmitButton {
                label: label.to_string(),
            },
        )
    }

    pub fn reset_button(name: &str, label: &str) -> Self {
        Self::new(
            name,
            label,
            FieldKind::ResetButton {
                label: label.to_string(),
            },
        )
    }

    pub fn button(name: &str, label: &str) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Button {
                label: label.to_string(),
            },
        )
    }

    pub fn divider(name: &str) -> Self {
        Self::new(name, "", FieldKind::Divider)
    }

    /// Mark the field required, using the engine's default message
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the field required with its own message
    pub fn required_with(mut self, message: &str) -> Self {
        self.required = true;
        self.required_message = Some(message.to_string());
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn with_initial(mut self, value: impl Into<FieldValue>) -> Self {
        self.initial_value = Some(value.into());
        self
    }

    /// Set the option restored on reset (radio groups and dropdowns only)
    pub fn with_default(mut self, value: &str) -> Self {
        if let FieldKind::RadioGroup { default, .. } | FieldKind::Dropdown { default, .. } =
            &mut self.kind
        {
            *default = Some(value.to_string());
        }
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Disable the field whenever `predicate` holds for the current values
    pub fn disabled_when(
        mut self,
        predicate: impl Fn(&Snapshot) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.disabled = Some(Arc::new(predicate));
        self
    }

    pub fn is_disabled(&self, values: &Snapshot) -> bool {
        self.disabled
            .as_ref()
            .is_some_and(|predicate| predicate(values))
    }

    pub fn holds_value(&self) -> bool {
        self.kind.holds_value()
    }

    /// Value seeded into the store when the field mounts
    pub fn seed_value(&self) -> Option<FieldValue> {
        if !self.holds_value() {
            return None;
        }
        self.initial_value
            .clone()
            .or_else(|| self.kind.default_value())
    }

    /// Check the kind payload and seed values before the field is registered
    pub fn check(&self) -> Result<(), FormError> {
        let invalid = |reason: &str| FormError::InvalidDescriptor {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() {
            return Err(invalid("name must not be empty"));
        }

        if let Some(options) = self.kind.options() {
            if options.is_empty() {
                return Err(invalid("option list must not be empty"));
            }
            let mut seen = HashSet::new();
            if !options.iter().all(|o| seen.insert(o.value.as_str())) {
                return Err(invalid("option values must be unique"));
            }
        }

        if let FieldKind::Number {
            min: Some(min),
            max: Some(max),
        } = &self.kind
        {
            if min > max {
                return Err(invalid("minimum is greater than maximum"));
            }
        }

        if let FieldKind::RadioGroup {
            default: Some(default),
            ..
        }
        | FieldKind::Dropdown {
            default: Some(default),
            ..
        } = &self.kind
        {
            if !self.kind.has_option(default) {
                return Err(invalid("default is not one of the options"));
            }
        }

        if let Some(initial) = &self.initial_value {
            if !self.holds_value() {
                return Err(invalid("field kind does not hold a value"));
            }
            if !self.kind.accepts_shape(initial) {
                return Err(FormError::ValueShape {
                    name: self.name.clone(),
                    expected: self.kind.expected_shape(),
                });
            }
            let unknown_option = match (&self.kind, initial) {
                (FieldKind::CheckboxGroup { .. }, FieldValue::Multi(items)) => {
                    items.iter().any(|item| !self.kind.has_option(item))
                }
                (FieldKind::RadioGroup { .. } | FieldKind::Dropdown { .. }, FieldValue::Single(v)) => {
                    !v.is_empty() && !self.kind.has_option(v)
                }
                _ => false,
            };
            if unknown_option {
                return Err(invalid("initial value is not one of the options"));
            }
        }

        Ok(())
    }
}
