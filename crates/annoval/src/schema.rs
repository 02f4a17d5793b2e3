//! Entity schema and field validation cache
//!
//! [`EntityClass`] is the explicit stand-in for host reflection: the
//! caller describes an entity type's fields, their raw annotation text and
//! the inheritance chain as plain data. From that description the cache
//! builds one validator per field and keeps the result for the lifetime of
//! the process, keyed by class name.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::annotations::parse;
use crate::errors::SchemaError;
use crate::registry::Registry;
use crate::resolver::resolve;
use crate::validators::{ImmutableValidator, Validate};

// ============================================================================
// Field and Class Descriptions
// ============================================================================

/// One declared field: name, raw annotation text, static marker.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    annotations: String,
    is_static: bool,
}

impl FieldSpec {
    /// Describe an instance field with its annotation text
    pub fn new(name: impl Into<String>, annotations: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: annotations.into(),
            is_static: false,
        }
    }

    /// Describe a static field (skipped during validator construction)
    pub fn new_static(name: impl Into<String>, annotations: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::new(name, annotations)
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw annotation text attached to the field
    pub fn annotations(&self) -> &str {
        &self.annotations
    }

    /// Whether the field is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }
}

/// An entity type described as data: its own fields, class-level
/// annotation text, and an optional parent in the inheritance chain.
///
/// # Example
///
/// ```
/// use annoval::{EntityClass, FieldSpec};
///
/// let class = EntityClass::new("app::User")
///     .field(FieldSpec::new("name", "@var string\n@minLength(1)"))
///     .field(FieldSpec::new("age", "@var int\n@min(0)\n@nullable"));
/// assert_eq!(class.name(), "app::User");
/// ```
#[derive(Debug, Clone)]
pub struct EntityClass {
    name: String,
    annotations: String,
    fields: Vec<FieldSpec>,
    parent: Option<Arc<EntityClass>>,
}

impl EntityClass {
    /// Start describing an entity type
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: String::new(),
            fields: Vec::new(),
            parent: None,
        }
    }

    /// Attach class-level annotation text (checked for `@immutable`)
    pub fn annotations(mut self, text: impl Into<String>) -> Self {
        self.annotations = text.into();
        self
    }

    /// Declare a field
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare the parent class in the inheritance chain
    pub fn extends(mut self, parent: Arc<EntityClass>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Class name (the cache key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own and inherited fields. Own-declared fields take precedence when
    /// a name collides across the inheritance chain.
    pub fn all_fields(&self) -> Vec<&FieldSpec> {
        let mut fields: Vec<&FieldSpec> = Vec::new();
        let mut class = Some(self);
        while let Some(current) = class {
            for field in &current.fields {
                if fields.iter().all(|known| known.name() != field.name()) {
                    fields.push(field);
                }
            }
            class = current.parent.as_deref();
        }
        fields
    }

    /// Whether this class or any ancestor carries a class-level
    /// `@immutable` tag
    pub fn is_immutable(&self) -> bool {
        let mut class = Some(self);
        while let Some(current) = class {
            if parse(&current.annotations).contains("immutable") {
                return true;
            }
            class = current.parent.as_deref();
        }
        false
    }
}

// ============================================================================
// Field Validation Cache
// ============================================================================

/// Resolved validators of one entity type, by field name.
pub type FieldValidators = HashMap<String, Arc<dyn Validate>>;

/// Process-wide cache: class name -> resolved field validators.
static CACHE: Lazy<RwLock<HashMap<String, Arc<FieldValidators>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Build the field validators of an entity class, without caching.
///
/// Static fields and fields tagged `@exclude` are skipped. A class-level
/// `@immutable` anywhere in the chain replaces every field's validator
/// with one shared immutable instance.
pub fn build_validators(
    class: &EntityClass,
    registry: &Registry,
) -> Result<FieldValidators, SchemaError> {
    let class_immutable = class.is_immutable();
    let shared_immutable: Arc<dyn Validate> = Arc::new(ImmutableValidator);

    let mut validators = FieldValidators::new();
    for field in class.all_fields() {
        if field.is_static() {
            continue;
        }
        let tags = parse(field.annotations());
        if tags.contains("exclude") {
            continue;
        }
        let validator = if class_immutable {
            shared_immutable.clone()
        } else {
            resolve(&tags, registry)?
        };
        validators.insert(field.name().to_string(), validator);
    }

    debug!(
        class = class.name(),
        fields = validators.len(),
        "built field validators"
    );
    Ok(validators)
}

/// Field validators of an entity class, built at most once per class name
/// and shared afterwards.
///
/// Concurrent first accesses are serialized on the write lock with a
/// re-check, so every caller observes the same validator tree. The cache
/// is never invalidated; schema comes from static declarations.
pub fn validators_for(
    class: &EntityClass,
    registry: &Registry,
) -> Result<Arc<FieldValidators>, SchemaError> {
    if let Some(validators) = CACHE.read().get(class.name()) {
        return Ok(validators.clone());
    }

    let mut cache = CACHE.write();
    if let Some(validators) = cache.get(class.name()) {
        return Ok(validators.clone());
    }

    let built = Arc::new(build_validators(class, registry)?);
    cache.insert(class.name().to_string(), built.clone());
    Ok(built)
}
