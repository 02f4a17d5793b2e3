//! Registry of custom validators and constant sets
//!
//! Dynamic lookup by string name is modeled as an explicit registry
//! populated at startup: validator names map to factories, and type paths
//! map to the constant lists backing the `classconstants` validator.

use std::collections::HashMap;
use std::sync::Arc;

use crate::annotations::TagTable;
use crate::errors::SchemaError;
use crate::validators::Validate;
use crate::value::Value;

// ============================================================================
// Validator Factory
// ============================================================================

/// Builds a validator from the tag table of one field.
///
/// Implemented by user code to plug custom validators into the resolver
/// under a name usable from `@validator(...)` tags.
pub trait ValidatorFactory: Send + Sync {
    /// Construct the validator from the field's tags
    fn build(&self, tags: &TagTable) -> Result<Arc<dyn Validate>, SchemaError>;
}

impl<F> ValidatorFactory for F
where
    F: Fn(&TagTable) -> Result<Arc<dyn Validate>, SchemaError> + Send + Sync,
{
    fn build(&self, tags: &TagTable) -> Result<Arc<dyn Validate>, SchemaError> {
        self(tags)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Startup-populated lookup tables the resolver consults.
///
/// # Example
///
/// ```
/// use annoval::{Registry, Value};
///
/// let mut registry = Registry::new();
/// registry.register_constants("app::Status", vec![
///     ("STATUS_ACTIVE".to_string(), Value::Int(1)),
///     ("STATUS_CLOSED".to_string(), Value::Int(2)),
/// ]);
/// assert!(registry.constants("app::Status").is_some());
/// ```
#[derive(Default, Clone)]
pub struct Registry {
    validators: HashMap<String, Arc<dyn ValidatorFactory>>,
    constants: HashMap<String, Vec<(String, Value)>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom validator factory under a name
    pub fn register_validator(
        &mut self,
        name: impl Into<String>,
        factory: impl ValidatorFactory + 'static,
    ) {
        self.validators.insert(name.into(), Arc::new(factory));
    }

    /// Look up a custom validator factory
    pub fn validator(&self, name: &str) -> Option<&Arc<dyn ValidatorFactory>> {
        self.validators.get(name)
    }

    /// Register the constants of a host type (name, value) in declaration
    /// order, for use by the `classconstants` validator
    pub fn register_constants(
        &mut self,
        type_path: impl Into<String>,
        constants: Vec<(String, Value)>,
    ) {
        self.constants.insert(type_path.into(), constants);
    }

    /// Look up the constants of a host type
    pub fn constants(&self, type_path: &str) -> Option<&[(String, Value)]> {
        self.constants.get(type_path).map(Vec::as_slice)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("validators", &self.validators.keys().collect::<Vec<_>>())
            .field("constants", &self.constants.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::AnyValidator;

    #[test]
    fn test_register_and_lookup_validator() {
        let mut registry = Registry::new();
        registry.register_validator("mine", |_tags: &TagTable| {
            Ok(Arc::new(AnyValidator) as Arc<dyn Validate>)
        });

        assert!(registry.validator("mine").is_some());
        assert!(registry.validator("other").is_none());

        let factory = registry.validator("mine").unwrap();
        assert!(factory.build(&TagTable::new()).is_ok());
    }

    #[test]
    fn test_register_and_lookup_constants() {
        let mut registry = Registry::new();
        registry.register_constants(
            "app::Color",
            vec![
                ("RED".to_string(), Value::Int(0)),
                ("GREEN".to_string(), Value::Int(1)),
            ],
        );

        let constants = registry.constants("app::Color").unwrap();
        assert_eq!(constants.len(), 2);
        assert_eq!(constants[0].0, "RED");
        assert!(registry.constants("app::Other").is_none());
    }
}
