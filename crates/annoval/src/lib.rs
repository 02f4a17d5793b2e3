//! Annoval
//!
//! Annotation-driven field validation: lightweight `@tag` annotations on
//! an entity's fields compile into composable validator trees that run on
//! every field write.
//!
//! The pipeline is a miniature schema compiler:
//!
//! ```text
//! annotation text -> tag table -> validator tree -> cached per entity type
//! ```
//!
//! - [`parse`] scans annotation text into a [`TagTable`] (permissive, never
//!   errors);
//! - [`resolve`] composes the tag table into a tree of [`Validate`]
//!   implementations (primitives, arrays, nullable/immutable wrappers,
//!   enums, instance-of checks, email/IP formats);
//! - [`EntityClass`] describes an entity type's fields and inheritance
//!   chain as plain data, and its resolved validators are cached once per
//!   class for the lifetime of the process;
//! - [`Entity`] is the `get`/`set` surface that routes every write through
//!   the cached validator, with one-shot lazy value resolution on read.
//!
//! # Example
//!
//! ```
//! use annoval::{Entity, EntityClass, FieldSpec, Registry, Value};
//!
//! let class = EntityClass::new("docs::Account")
//!     .field(FieldSpec::new("email", "@validator(email)"))
//!     .field(FieldSpec::new("logins", "@var int\n@min(0)"));
//!
//! let mut account = Entity::new(&class, &Registry::new()).unwrap();
//! account.set("email", Value::Str("user@example.com".into())).unwrap();
//! account.set("logins", Value::Str("3".into())).unwrap();
//! assert_eq!(account.get("logins").unwrap(), &Value::Int(3));
//!
//! // constraint violations reject the write and keep the old value
//! assert!(account.set("logins", Value::Int(-1)).is_err());
//! ```

pub mod annotations;
pub mod coerce;
pub mod entity;
pub mod errors;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod validators;
pub mod value;

// Re-export commonly used types
pub use annotations::{parse, TagTable};
pub use coerce::coerce;
pub use entity::{Entity, LazyLoad};
pub use errors::{SchemaError, ValidationError, ValidationResult};
pub use registry::{Registry, ValidatorFactory};
pub use resolver::resolve;
pub use schema::{build_validators, validators_for, EntityClass, FieldSpec, FieldValidators};
pub use validators::Validate;
pub use value::{Instance, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
