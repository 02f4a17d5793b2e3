//! Entity accessors
//!
//! [`Entity`] is the explicit `get`/`set` surface over an annotated
//! entity type: every write routes through the field's cached validator
//! before the value is stored, and a field may hold a lazy placeholder
//! that resolves to its real value on first read.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{SchemaError, ValidationError, ValidationResult};
use crate::registry::Registry;
use crate::schema::{self, EntityClass, FieldValidators};
use crate::value::Value;

// ============================================================================
// Lazy Values
// ============================================================================

/// A placeholder that produces a field's real value on first read.
///
/// The produced value goes through the normal write-validate path exactly
/// once, then replaces the placeholder.
pub trait LazyLoad: Send + Sync {
    /// Load and return the value
    fn load(&self) -> Value;
}

impl<F> LazyLoad for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn load(&self) -> Value {
        self()
    }
}

enum Slot {
    Eager(Value),
    Lazy(Arc<dyn LazyLoad>),
}

// ============================================================================
// Entity
// ============================================================================

/// An instance of an annotated entity type.
///
/// Fields start as `Null`. Each `set` validates (and possibly coerces) the
/// incoming value against the field's cached validator; a failed write
/// leaves the field unmodified.
///
/// # Example
///
/// ```
/// use annoval::{Entity, EntityClass, FieldSpec, Registry, Value};
///
/// let class = EntityClass::new("docs::Person")
///     .field(FieldSpec::new("age", "@var int\n@min(0)"));
/// let mut person = Entity::new(&class, &Registry::new()).unwrap();
///
/// person.set("age", Value::Str("42".into())).unwrap();
/// assert_eq!(person.get("age").unwrap(), &Value::Int(42));
/// assert!(person.set("age", Value::Int(-1)).is_err());
/// ```
pub struct Entity {
    class_name: String,
    validators: Arc<FieldValidators>,
    values: HashMap<String, Slot>,
}

impl Entity {
    /// Create an instance of the given entity class.
    ///
    /// Builds (or reuses) the class's field validators; a schema problem
    /// in any field's annotations surfaces here.
    pub fn new(class: &EntityClass, registry: &Registry) -> Result<Self, SchemaError> {
        let validators = schema::validators_for(class, registry)?;
        let values = validators
            .keys()
            .map(|name| (name.clone(), Slot::Eager(Value::Null)))
            .collect();
        Ok(Self {
            class_name: class.name().to_string(),
            validators,
            values,
        })
    }

    /// Name of the entity class this is an instance of
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Field names with validators, in no particular order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    /// Write a field, validating and coercing the value first.
    ///
    /// On failure the stored value is untouched and the error describes
    /// the rejection.
    pub fn set(&mut self, name: &str, value: Value) -> ValidationResult {
        let Some(validator) = self.validators.get(name) else {
            return Err(ValidationError::UnknownField(name.to_string()));
        };
        let mut candidate = value;
        validator.validate(&mut candidate)?;
        self.values.insert(name.to_string(), Slot::Eager(candidate));
        Ok(())
    }

    /// Store a lazy placeholder for a field.
    ///
    /// The placeholder bypasses validation; the loaded value is validated
    /// when the field is first read.
    pub fn set_lazy(&mut self, name: &str, loader: Arc<dyn LazyLoad>) -> ValidationResult {
        if !self.validators.contains_key(name) {
            return Err(ValidationError::UnknownField(name.to_string()));
        }
        self.values.insert(name.to_string(), Slot::Lazy(loader));
        Ok(())
    }

    /// Read a field, resolving a lazy placeholder first if one is stored.
    ///
    /// Resolution happens exactly once: the loaded value passes through
    /// `set` and replaces the placeholder. A loaded value that fails its
    /// validator surfaces as the read's error and the placeholder is kept,
    /// so the load is retried on the next read.
    pub fn get(&mut self, name: &str) -> ValidationResult<&Value> {
        let loader = match self.values.get(name) {
            None => return Err(ValidationError::UnknownField(name.to_string())),
            Some(Slot::Lazy(loader)) => Some(loader.clone()),
            Some(Slot::Eager(_)) => None,
        };

        if let Some(loader) = loader {
            self.set(name, loader.load())?;
        }

        match self.values.get(name) {
            Some(Slot::Eager(value)) => Ok(value),
            _ => Err(ValidationError::UnknownField(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn person_class(name: &str) -> EntityClass {
        EntityClass::new(name)
            .field(FieldSpec::new("name", "@var string\n@minLength(3)\n@maxLength(20)"))
            .field(FieldSpec::new("age", "@var int\n@min(0)\n@nullable"))
    }

    #[test]
    fn test_fields_start_null() {
        let class = person_class("entity_tests::Fresh");
        let mut entity = Entity::new(&class, &Registry::new()).unwrap();
        assert_eq!(entity.get("name").unwrap(), &Value::Null);
    }

    #[test]
    fn test_set_validates_and_coerces() {
        let class = person_class("entity_tests::Person");
        let mut entity = Entity::new(&class, &Registry::new()).unwrap();

        entity.set("age", Value::Str("30".into())).unwrap();
        assert_eq!(entity.get("age").unwrap(), &Value::Int(30));

        entity.set("age", Value::Null).unwrap();
        assert_eq!(entity.get("age").unwrap(), &Value::Null);
    }

    #[test]
    fn test_failed_set_leaves_field_unmodified() {
        let class = person_class("entity_tests::Keeps");
        let mut entity = Entity::new(&class, &Registry::new()).unwrap();

        entity.set("name", Value::Str("Alice".into())).unwrap();
        assert!(entity.set("name", Value::Str("ab".into())).is_err());
        assert_eq!(entity.get("name").unwrap(), &Value::Str("Alice".into()));
    }

    #[test]
    fn test_unknown_field() {
        let class = person_class("entity_tests::Unknown");
        let mut entity = Entity::new(&class, &Registry::new()).unwrap();
        assert!(matches!(
            entity.set("nope", Value::Int(1)),
            Err(ValidationError::UnknownField(_))
        ));
        assert!(entity.get("nope").is_err());
    }

    #[test]
    fn test_lazy_resolves_once() {
        let class = person_class("entity_tests::Lazy");
        let mut entity = Entity::new(&class, &Registry::new()).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        entity
            .set_lazy(
                "age",
                Arc::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Value::Str("25".into())
                }),
            )
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(entity.get("age").unwrap(), &Value::Int(25));
        assert_eq!(entity.get("age").unwrap(), &Value::Int(25));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lazy_value_is_validated() {
        let class = person_class("entity_tests::LazyBad");
        let mut entity = Entity::new(&class, &Registry::new()).unwrap();

        entity
            .set_lazy("age", Arc::new(|| Value::Int(-4)))
            .unwrap();
        assert!(matches!(
            entity.get("age"),
            Err(ValidationError::BelowMinimum { .. })
        ));
    }
}
