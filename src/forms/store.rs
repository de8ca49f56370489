//! Ordered value storage for a form instance

use super::field::FieldValue;
use super::registry::FieldRegistry;
use crate::error::FormError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Immutable, ordered copy of a form's values at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(IndexMap<String, FieldValue>);

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Overlay `other` onto this snapshot; colliding keys take `other`'s value
    pub fn merge_from(&mut self, other: &Snapshot) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), value.clone());
        }
    }

    pub fn into_inner(self) -> IndexMap<String, FieldValue> {
        self.0
    }
}

impl FromIterator<(String, FieldValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Snapshot(iter.into_iter().collect())
    }
}

impl IntoIterator for Snapshot {
    type Item = (String, FieldValue);
    type IntoIter = indexmap::map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Current values keyed by field name, in registration order
///
/// Every key belongs to a live field of the companion [`FieldRegistry`];
/// writes are checked against it.
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    values: IndexMap<String, FieldValue>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_value(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Write one field's value
    pub fn set_value(
        &mut self,
        registry: &FieldRegistry,
        name: &str,
        value: FieldValue,
    ) -> Result<(), FormError> {
        Self::check_write(registry, name, &value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Write several values; nothing is applied unless every entry is acceptable
    pub fn merge(&mut self, registry: &FieldRegistry, partial: &Snapshot) -> Result<(), FormError> {
        for (name, value) in partial.iter() {
            Self::check_write(registry, name, value)?;
        }
        for (name, value) in partial.iter() {
            self.values.insert(name.to_string(), value.clone());
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(self.values.clone())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Seed a freshly registered field; goes to the end of the ordering
    pub(crate) fn seed(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.shift_remove(name)
    }

    /// Restore every value field to its kind default
    pub(crate) fn reset(&mut self, registry: &FieldRegistry) {
        for field in registry.list() {
            if let Some(value) = field.kind.default_value() {
                self.values.insert(field.name.clone(), value);
            }
        }
    }

    fn check_write(registry: &FieldRegistry, name: &str, value: &FieldValue) -> Result<(), FormError> {
        let field = registry
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        if !field.holds_value() {
            return Err(FormError::NotAValueField(name.to_string()));
        }
        if !field.kind.accepts_shape(value) {
            return Err(FormError::ValueShape {
                name: name.to_string(),
                expected: field.kind.expected_shape(),
            });
        }
        Ok(())
    }
}
