//! Registry of the fields mounted in one form instance

use super::field::FieldDescriptor;
use crate::error::FormError;
use indexmap::IndexMap;

#[derive(Debug, Clone)]
struct MountedField {
    descriptor: FieldDescriptor,
    generation: u64,
}

/// Mounted fields in registration order
///
/// Every registration receives a fresh mount generation, so a result
/// computed for an earlier mount of the same name can be told apart from
/// one computed for the current mount.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: IndexMap<String, MountedField>,
    next_generation: u64,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a field, returning its generation
    pub fn register(&mut self, descriptor: FieldDescriptor) -> Result<u64, FormError> {
        if self.fields.contains_key(&descriptor.name) {
            return Err(FormError::DuplicateField(descriptor.name));
        }
        descriptor.check()?;

        self.next_generation += 1;
        let generation = self.next_generation;
        self.fields.insert(
            descriptor.name.clone(),
            MountedField {
                descriptor,
                generation,
            },
        );
        Ok(generation)
    }

    /// Unmount a field; unknown names are ignored
    pub fn unregister(&mut self, name: &str) -> Option<FieldDescriptor> {
        self.fields.shift_remove(name).map(|field| field.descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name).map(|field| &field.descriptor)
    }

    pub fn generation(&self, name: &str) -> Option<u64> {
        self.fields.get(name).map(|field| field.generation)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn list(&self) -> Vec<&FieldDescriptor> {
        self.fields.values().map(|field| &field.descriptor).collect()
    }

    /// Value-holding fields paired with their current generation
    pub fn mounted_values(&self) -> Vec<(FieldDescriptor, u64)> {
        self.fields
            .values()
            .filter(|field| field.descriptor.holds_value())
            .map(|field| (field.descriptor.clone(), field.generation))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_preserves_order() {
        let mut registry = FieldRegistry::new();
        registry.register(FieldDescriptor::text("b", "B")).unwrap();
        registry.register(FieldDescriptor::text("a", "A")).unwrap();
        registry.register(FieldDescriptor::divider("sep")).unwrap();

        let names: Vec<&str> = registry.list().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "sep"]);
    }

    #[test]
    fn test_duplicate_name_fails() {
        let mut registry = FieldRegistry::new();
        registry.register(FieldDescriptor::text("email", "Email")).unwrap();

        let err = registry
            .register(FieldDescriptor::email("email", "Email again"))
            .unwrap_err();

        assert!(matches!(err, FormError::DuplicateField(name) if name == "email"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_after_unregister_succeeds() {
        let mut registry = FieldRegistry::new();
        registry.register(FieldDescriptor::text("email", "Email")).unwrap();
        registry.unregister("email");

        assert!(registry.register(FieldDescriptor::text("email", "Email")).is_ok());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let mut registry = FieldRegistry::new();
        registry.register(FieldDescriptor::text("a", "A")).unwrap();

        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remount_gets_new_generation() {
        let mut registry = FieldRegistry::new();
        let first = registry.register(FieldDescriptor::text("a", "A")).unwrap();
        registry.unregister("a");
        let second = registry.register(FieldDescriptor::text("a", "A")).unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.generation("a"), Some(second));
    }

    #[test]
    fn test_malformed_descriptor_is_rejected() {
        let mut registry = FieldRegistry::new();
        let err = registry
            .register(FieldDescriptor::radio_group("r", "R", vec![]))
            .unwrap_err();
        assert!(matches!(err, FormError::InvalidDescriptor { .. }));
        assert!(!registry.contains("r"));
    }

    #[test]
    fn test_mounted_values_skips_buttons() {
        let mut registry = FieldRegistry::new();
        registry.register(FieldDescriptor::text("a", "A")).unwrap();
        registry
            .register(FieldDescriptor::submit_button("go", "Go"))
            .unwrap();

        let mounted = registry.mounted_values();
        assert_eq!(mounted.len(), 1);
        assert_eq!(mounted[0].0.name, "a");
    }
}
