//! Validator resolver
//!
//! Turns the tag table of one field into a composed validator tree:
//! immutability short-circuits everything, `nullable` wraps, `type[]`
//! recurses into an array element validator, type spellings canonicalize
//! through the alias table, and unknown type names fall back to an
//! instance-of check carrying the name as `classname`.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::annotations::TagTable;
use crate::errors::SchemaError;
use crate::registry::Registry;
use crate::validators::{
    AnyValidator, ArrayValidator, BooleanValidator, ClassConstantsValidator, EmailValidator,
    EnumValidator, FloatValidator, ImmutableValidator, IntegerValidator, IpValidator,
    NullableValidator, ObjectValidator, StringValidator, Validate,
};
use crate::value::Value;

/// Common type spellings mapped to canonical names
static TYPE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("String", "string"),
        ("long", "integer"),
        ("int", "integer"),
        ("number", "float"),
        ("double", "float"),
        ("bool", "boolean"),
        ("mixed", "any"),
        ("Array", "array"),
    ])
});

/// Canonical primitive type names
const PRIMITIVES: [&str; 6] = ["string", "integer", "float", "boolean", "array", "any"];

fn canonical(name: &str) -> &str {
    TYPE_ALIASES.get(name).copied().unwrap_or(name)
}

/// Resolve a field's tag table into a validator.
///
/// Precedence: `immutable` wins over everything; `nullable` wraps the
/// resolution of the remaining tags; the declared type comes from `var`
/// (default `any`) unless an explicit `validator` tag overrides it; names
/// outside the primitive set become an instance-of check. Custom validator
/// names resolve through the registry.
///
/// # Example
///
/// ```
/// use annoval::{parse, resolve, Registry, Value};
///
/// let tags = parse("@var int[]\n");
/// let validator = resolve(&tags, &Registry::new()).unwrap();
///
/// let mut value = Value::List(vec![Value::Str("4".into())]);
/// validator.validate(&mut value).unwrap();
/// assert_eq!(value, Value::List(vec![Value::Int(4)]));
/// ```
pub fn resolve(tags: &TagTable, registry: &Registry) -> Result<Arc<dyn Validate>, SchemaError> {
    // immutable ignores every other tag
    if tags.contains("immutable") {
        return Ok(Arc::new(ImmutableValidator));
    }

    // nullable wraps the resolution of the remaining tags
    if tags.contains("nullable") {
        let mut rest = tags.clone();
        rest.remove("nullable");
        let inner = resolve(&rest, registry)?;
        return Ok(Arc::new(NullableValidator::new(inner)));
    }

    let var = tags
        .first("var")
        .and_then(Value::coerce_string)
        .unwrap_or_else(|| "any".to_string());

    // array types: strip the `[]` suffix (or treat bare `array` as a list
    // of anything) and resolve the element validator recursively
    let element_type = if let Some(stripped) = var.strip_suffix("[]") {
        Some(stripped.to_string())
    } else if var == "array" || var == "Array" {
        Some("any".to_string())
    } else {
        None
    };

    if let Some(element_type) = element_type {
        let mut element_tags = tags.clone();
        element_tags.set_first("var", Value::Str(element_type));
        let element = resolve(&element_tags, registry)?;
        return Ok(Arc::new(ArrayValidator::new(element)));
    }

    // explicit validator name falls back to the declared type
    let explicit = tags
        .first("validator")
        .and_then(Value::coerce_string)
        .filter(|name| !name.is_empty());

    let var = canonical(&var).to_string();
    let mut validator = match explicit {
        Some(name) => canonical(&name).to_string(),
        None => var.clone(),
    };

    // a non-primitive type validated by itself is an object type
    let mut tags = tags.clone();
    if !PRIMITIVES.contains(&var.as_str()) && validator == var {
        tags.set_first("classname", Value::Str(var.clone()));
        validator = "object".to_string();
    }

    debug!(validator = %validator, "resolving field validator");

    let resolved: Arc<dyn Validate> = match validator.as_str() {
        "any" => Arc::new(AnyValidator),
        "boolean" => Arc::new(BooleanValidator::from_tags(&tags)),
        "integer" => Arc::new(IntegerValidator::from_tags(&tags)),
        "float" => Arc::new(FloatValidator::from_tags(&tags)),
        "string" => Arc::new(StringValidator::from_tags(&tags)?),
        "enum" => Arc::new(EnumValidator::from_tags(&tags)?),
        "classconstants" => Arc::new(ClassConstantsValidator::from_tags(&tags, registry)?),
        "object" => Arc::new(ObjectValidator::from_tags(&tags)?),
        "email" => Arc::new(EmailValidator),
        "ip" => Arc::new(IpValidator),
        "immutable" => Arc::new(ImmutableValidator),
        "array" => {
            return Err(SchemaError::InvalidTag {
                tag: "validator",
                reason: "array validation needs an element type, declare `@var type[]`"
                    .to_string(),
            });
        }
        "nullable" => {
            return Err(SchemaError::InvalidTag {
                tag: "validator",
                reason: "nullable is declared with a `@nullable` tag, not a validator name"
                    .to_string(),
            });
        }
        name => match registry.validator(name) {
            Some(factory) => factory.build(&tags)?,
            None => return Err(SchemaError::UnknownValidator(name.to_string())),
        },
    };

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::parse;
    use crate::errors::ValidationError;
    use crate::value::Instance;

    fn run(validator: &dyn Validate, value: Value) -> Result<Value, ValidationError> {
        let mut v = value;
        validator.validate(&mut v)?;
        Ok(v)
    }

    #[test]
    fn test_default_is_any() {
        let v = resolve(&TagTable::new(), &Registry::new()).unwrap();
        assert!(run(&*v, Value::Null).is_ok());
        assert!(run(&*v, Value::List(vec![])).is_ok());
    }

    #[test]
    fn test_primitive_aliases() {
        let registry = Registry::new();
        let v = resolve(&parse("@var int\n"), &registry).unwrap();
        assert_eq!(run(&*v, Value::Str("3".into())).unwrap(), Value::Int(3));

        let v = resolve(&parse("@var String\n"), &registry).unwrap();
        assert_eq!(run(&*v, Value::Int(3)).unwrap(), Value::Str("3".into()));

        let v = resolve(&parse("@var double\n"), &registry).unwrap();
        assert_eq!(run(&*v, Value::Int(3)).unwrap(), Value::Float(3.0));

        let v = resolve(&parse("@var bool\n"), &registry).unwrap();
        assert_eq!(run(&*v, Value::Int(1)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_int_array_composes() {
        let v = resolve(&parse("@var int[]\n"), &Registry::new()).unwrap();
        let out = run(
            &*v,
            Value::List(vec![Value::Str("1".into()), Value::Int(2)]),
        )
        .unwrap();
        assert_eq!(out, Value::List(vec![Value::Int(1), Value::Int(2)]));
        assert!(run(&*v, Value::Int(1)).is_err());
    }

    #[test]
    fn test_bare_array_is_list_of_any() {
        let v = resolve(&parse("@var array\n"), &Registry::new()).unwrap();
        assert!(run(&*v, Value::List(vec![Value::Null, Value::Int(1)])).is_ok());
        assert!(run(&*v, Value::Str("x".into())).is_err());
    }

    #[test]
    fn test_nested_array_of_arrays() {
        let v = resolve(&parse("@var int[][]\n"), &Registry::new()).unwrap();
        let ok = Value::List(vec![Value::List(vec![Value::Str("7".into())])]);
        assert_eq!(
            run(&*v, ok).unwrap(),
            Value::List(vec![Value::List(vec![Value::Int(7)])])
        );
        assert!(run(&*v, Value::List(vec![Value::Int(7)])).is_err());
    }

    #[test]
    fn test_array_element_keeps_constraints() {
        let v = resolve(&parse("@var int[]\n@min(10)\n"), &Registry::new()).unwrap();
        assert!(run(&*v, Value::List(vec![Value::Int(5)])).is_err());
        assert!(run(&*v, Value::List(vec![Value::Int(15)])).is_ok());
    }

    #[test]
    fn test_nullable_wraps_object() {
        let v = resolve(&parse("@var Foo\n@nullable\n"), &Registry::new()).unwrap();
        assert!(run(&*v, Value::Null).is_ok());
        assert!(run(&*v, Value::Instance(Instance::new("app::Foo"))).is_ok());
        assert!(run(&*v, Value::Instance(Instance::new("app::Bar"))).is_err());
        assert!(run(&*v, Value::Int(1)).is_err());
    }

    #[test]
    fn test_immutable_ignores_other_tags() {
        let v = resolve(&parse("@var int\n@immutable\n"), &Registry::new()).unwrap();
        assert!(matches!(
            run(&*v, Value::Int(1)),
            Err(ValidationError::Immutable)
        ));
        assert!(run(&*v, Value::Null).is_err());
    }

    #[test]
    fn test_immutable_beats_nullable() {
        let v = resolve(&parse("@nullable\n@immutable\n"), &Registry::new()).unwrap();
        assert!(run(&*v, Value::Null).is_err());
    }

    #[test]
    fn test_explicit_validator_tag() {
        let registry = Registry::new();
        let v = resolve(&parse("@validator(email)\n"), &registry).unwrap();
        assert!(run(&*v, Value::Str("a@b.co".into())).is_ok());
        assert!(run(&*v, Value::Str("nope".into())).is_err());

        let v = resolve(&parse("@var string\n@validator(ip)\n"), &registry).unwrap();
        assert!(run(&*v, Value::Str("10.0.0.1".into())).is_ok());
    }

    #[test]
    fn test_enum_validator_resolution() {
        let v = resolve(
            &parse("@validator(enum)\n@enum([\"a\", \"b\"])\n"),
            &Registry::new(),
        )
        .unwrap();
        assert!(run(&*v, Value::Str("a".into())).is_ok());
        assert!(run(&*v, Value::Str("c".into())).is_err());
    }

    #[test]
    fn test_class_constants_resolution() {
        let mut registry = Registry::new();
        registry.register_constants(
            "app::Status",
            vec![
                ("STATUS_ON".to_string(), Value::Int(1)),
                ("OTHER".to_string(), Value::Int(2)),
            ],
        );
        let tags = parse("@validator(classconstants)\n@classname(app::Status)\n@beginWith(STATUS_)\n");
        let v = resolve(&tags, &registry).unwrap();
        assert!(run(&*v, Value::Int(1)).is_ok());
        assert!(run(&*v, Value::Int(2)).is_err());
    }

    #[test]
    fn test_custom_validator_from_registry() {
        let mut registry = Registry::new();
        registry.register_validator("uppercase", |_tags: &TagTable| {
            struct Uppercase;
            impl Validate for Uppercase {
                fn validate(&self, value: &mut Value) -> Result<(), ValidationError> {
                    match value {
                        Value::Str(s) if s.chars().all(|c| !c.is_lowercase()) => Ok(()),
                        other => Err(ValidationError::UnexpectedValue(other.describe())),
                    }
                }
            }
            Ok(Arc::new(Uppercase) as Arc<dyn Validate>)
        });

        let v = resolve(&parse("@validator(uppercase)\n"), &registry).unwrap();
        assert!(run(&*v, Value::Str("ABC".into())).is_ok());
        assert!(run(&*v, Value::Str("abc".into())).is_err());
    }

    #[test]
    fn test_unknown_validator_name() {
        let err = resolve(&parse("@validator(bogus)\n"), &Registry::new())
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownValidator(name) if name == "bogus"));
    }

    #[test]
    fn test_unknown_object_type_is_object_validator() {
        // no registry entry needed: a bare non-primitive name resolves to
        // an instance-of check
        let v = resolve(&parse("@var DateTime\n"), &Registry::new()).unwrap();
        assert!(run(&*v, Value::Instance(Instance::new("time::DateTime"))).is_ok());
    }
}
