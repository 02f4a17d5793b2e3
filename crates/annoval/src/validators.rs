//! Validator variants
//!
//! Every variant implements the same [`Validate`] contract: check a
//! candidate value taken by mutable reference, normalizing it to the
//! canonical representation on success unless the `strict` tag disabled
//! coercion. Validators are immutable after construction and hold no
//! reference to any field instance, so one tree serves every instance of
//! an entity type.

use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use std::sync::Arc;

use crate::annotations::TagTable;
use crate::errors::{SchemaError, ValidationError, ValidationResult};
use crate::registry::Registry;
use crate::value::Value;

/// Email pattern (RFC 5322 simplified)
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

// ============================================================================
// Contract
// ============================================================================

/// Validation contract shared by every variant.
pub trait Validate: Send + Sync {
    /// Validate a candidate value, coercing it in place on success.
    ///
    /// On failure the value is left as passed in and the caller must not
    /// store it.
    fn validate(&self, value: &mut Value) -> ValidationResult;
}

// ============================================================================
// Tag Helpers
// ============================================================================

/// Numeric tag value as an integer; non-numeric tags are ignored.
fn tag_int(tags: &TagTable, name: &str) -> Option<i64> {
    tags.first(name).and_then(numeric_int)
}

fn numeric_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => Some(*f as i64),
        Value::Str(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(|f| f as i64)),
        _ => None,
    }
}

/// Numeric tag value as a float; non-numeric tags are ignored.
fn tag_float(tags: &TagTable, name: &str) -> Option<f64> {
    tags.first(name).and_then(|value| match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Str(s) => s.parse::<f64>().ok(),
        _ => None,
    })
}

/// Scalar tag value as a string.
fn tag_string(tags: &TagTable, name: &str) -> Option<String> {
    tags.first(name).and_then(Value::coerce_string)
}

fn type_mismatch(expected: &'static str, value: &Value) -> ValidationError {
    ValidationError::TypeMismatch {
        expected,
        given: value.describe(),
    }
}

// ============================================================================
// Any
// ============================================================================

/// Accepts every value unchanged.
#[derive(Debug, Default)]
pub struct AnyValidator;

impl Validate for AnyValidator {
    fn validate(&self, _value: &mut Value) -> ValidationResult {
        Ok(())
    }
}

// ============================================================================
// Boolean
// ============================================================================

/// Boolean validator. Non-strict mode accepts anything and casts by
/// truthiness; strict mode requires a native boolean.
#[derive(Debug, Default)]
pub struct BooleanValidator {
    strict: bool,
}

impl BooleanValidator {
    /// Build from field tags (`strict`)
    pub fn from_tags(tags: &TagTable) -> Self {
        Self {
            strict: tags.contains("strict"),
        }
    }
}

impl Validate for BooleanValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        if self.strict && !matches!(value, Value::Bool(_)) {
            return Err(type_mismatch("boolean", value));
        }
        *value = Value::Bool(value.truthy());
        Ok(())
    }
}

// ============================================================================
// Integer
// ============================================================================

/// Integer validator with optional bounds (`min`/`max` tags).
#[derive(Debug, Default)]
pub struct IntegerValidator {
    strict: bool,
    min: Option<i64>,
    max: Option<i64>,
}

impl IntegerValidator {
    /// Build from field tags (`strict`, `min`, `max`)
    pub fn from_tags(tags: &TagTable) -> Self {
        Self {
            strict: tags.contains("strict"),
            min: tag_int(tags, "min"),
            max: tag_int(tags, "max"),
        }
    }
}

impl Validate for IntegerValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        if self.strict && !matches!(value, Value::Int(_)) {
            return Err(type_mismatch("integer", value));
        }
        if !value.is_scalar() {
            return Err(type_mismatch("scalar", value));
        }
        let n = value
            .coerce_int()
            .ok_or_else(|| type_mismatch("integer", value))?;
        if let Some(min) = self.min {
            if n < min {
                return Err(ValidationError::BelowMinimum {
                    min: min.to_string(),
                    given: n.to_string(),
                });
            }
        }
        if let Some(max) = self.max {
            if n > max {
                return Err(ValidationError::AboveMaximum {
                    max: max.to_string(),
                    given: n.to_string(),
                });
            }
        }
        *value = Value::Int(n);
        Ok(())
    }
}

// ============================================================================
// Float
// ============================================================================

/// Float validator with optional bounds (`min`/`max` tags).
#[derive(Debug, Default)]
pub struct FloatValidator {
    strict: bool,
    min: Option<f64>,
    max: Option<f64>,
}

impl FloatValidator {
    /// Build from field tags (`strict`, `min`, `max`)
    pub fn from_tags(tags: &TagTable) -> Self {
        Self {
            strict: tags.contains("strict"),
            min: tag_float(tags, "min"),
            max: tag_float(tags, "max"),
        }
    }
}

impl Validate for FloatValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        if self.strict && !matches!(value, Value::Float(_)) {
            return Err(type_mismatch("float", value));
        }
        if !value.is_scalar() {
            return Err(type_mismatch("scalar", value));
        }
        let f = value
            .coerce_float()
            .ok_or_else(|| type_mismatch("float", value))?;
        if let Some(min) = self.min {
            if f < min {
                return Err(ValidationError::BelowMinimum {
                    min: min.to_string(),
                    given: f.to_string(),
                });
            }
        }
        if let Some(max) = self.max {
            if f > max {
                return Err(ValidationError::AboveMaximum {
                    max: max.to_string(),
                    given: f.to_string(),
                });
            }
        }
        *value = Value::Float(f);
        Ok(())
    }
}

// ============================================================================
// String
// ============================================================================

/// String validator with optional length bounds and pattern
/// (`minlength`/`maxlength`/`regex` tags).
#[derive(Debug, Default)]
pub struct StringValidator {
    strict: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
}

impl StringValidator {
    /// Build from field tags (`strict`, `minlength`, `maxlength`, `regex`)
    pub fn from_tags(tags: &TagTable) -> Result<Self, SchemaError> {
        let pattern = match tags.first("regex") {
            Some(Value::Str(raw)) => {
                Some(Regex::new(raw).map_err(|source| SchemaError::BadPattern {
                    pattern: raw.clone(),
                    source,
                })?)
            }
            _ => None,
        };

        Ok(Self {
            strict: tags.contains("strict"),
            min_length: tag_int(tags, "minlength").map(|n| n.max(0) as usize),
            max_length: tag_int(tags, "maxlength").map(|n| n.max(0) as usize),
            pattern,
        })
    }
}

impl Validate for StringValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        if self.strict && !matches!(value, Value::Str(_)) {
            return Err(type_mismatch("string", value));
        }
        let s = value
            .coerce_string()
            .ok_or_else(|| type_mismatch("scalar", value))?;

        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                return Err(ValidationError::TooShort { min, len });
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(ValidationError::TooLong { max, len });
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(&s) {
                return Err(ValidationError::PatternMismatch {
                    pattern: pattern.as_str().to_string(),
                });
            }
        }

        *value = Value::Str(s);
        Ok(())
    }
}

// ============================================================================
// Array
// ============================================================================

/// Array validator: every element passes the element validator, coerced in
/// place. The first element failure aborts with the offending key wrapped
/// around the inner error.
pub struct ArrayValidator {
    element: Arc<dyn Validate>,
}

impl ArrayValidator {
    /// Create with the validator applied to each element
    pub fn new(element: Arc<dyn Validate>) -> Self {
        Self { element }
    }
}

impl Validate for ArrayValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        let Value::List(items) = value else {
            return Err(type_mismatch("array", value));
        };
        for (index, item) in items.iter_mut().enumerate() {
            self.element
                .validate(item)
                .map_err(|err| err.at_key(index.to_string()))?;
        }
        Ok(())
    }
}

// ============================================================================
// Nullable
// ============================================================================

/// Nullable wrapper: null passes unconditionally, anything else is fully
/// delegated to the wrapped validator (including its coercion).
pub struct NullableValidator {
    inner: Arc<dyn Validate>,
}

impl NullableValidator {
    /// Create with the validator applied to non-null values
    pub fn new(inner: Arc<dyn Validate>) -> Self {
        Self { inner }
    }
}

impl Validate for NullableValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        if value.is_null() {
            return Ok(());
        }
        self.inner.validate(value)
    }
}

// ============================================================================
// Immutable
// ============================================================================

/// Rejects every write, null and already-matching values included.
#[derive(Debug, Default)]
pub struct ImmutableValidator;

impl Validate for ImmutableValidator {
    fn validate(&self, _value: &mut Value) -> ValidationResult {
        Err(ValidationError::Immutable)
    }
}

// ============================================================================
// Enum
// ============================================================================

/// Membership in a fixed set of allowed values. Comparison is strict
/// identity: `1` and `"1"` are different members.
#[derive(Debug)]
pub struct EnumValidator {
    allowed: Vec<Value>,
}

impl EnumValidator {
    /// Create from an explicit allowed set
    pub fn new(allowed: Vec<Value>) -> Self {
        Self { allowed }
    }

    /// Build from field tags (`enum` holding a list of allowed values)
    pub fn from_tags(tags: &TagTable) -> Result<Self, SchemaError> {
        match tags.first("enum") {
            None => Err(SchemaError::MissingTag("enum")),
            Some(Value::List(allowed)) => Ok(Self::new(allowed.clone())),
            Some(_) => Err(SchemaError::InvalidTag {
                tag: "enum",
                reason: "must be an array".to_string(),
            }),
        }
    }
}

impl Validate for EnumValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        if !self.allowed.contains(value) {
            return Err(ValidationError::UnexpectedValue(value.describe()));
        }
        Ok(())
    }
}

// ============================================================================
// Class Constants
// ============================================================================

/// Enum whose allowed set is the constant values of a registered host
/// type, filtered by constant *name* with the optional `beginwith`,
/// `endwith` and `contain` tags. The set is built once at construction;
/// afterwards this behaves exactly like [`EnumValidator`].
#[derive(Debug)]
pub struct ClassConstantsValidator {
    inner: EnumValidator,
}

impl ClassConstantsValidator {
    /// Build from field tags (`classname` plus optional name filters),
    /// enumerating constants through the registry
    pub fn from_tags(tags: &TagTable, registry: &Registry) -> Result<Self, SchemaError> {
        let type_path = match tags.first("classname") {
            None => return Err(SchemaError::MissingTag("classname")),
            Some(Value::Str(path)) => path.clone(),
            Some(_) => {
                return Err(SchemaError::InvalidTag {
                    tag: "classname",
                    reason: "must be a string".to_string(),
                });
            }
        };

        let constants = registry
            .constants(&type_path)
            .ok_or_else(|| SchemaError::UnknownConstants(type_path.clone()))?;

        let begin_with = tag_string(tags, "beginwith");
        let end_with = tag_string(tags, "endwith");
        let contain = tag_string(tags, "contain");

        let allowed = constants
            .iter()
            .filter(|(name, _)| {
                begin_with.as_deref().map_or(true, |p| name.starts_with(p))
                    && end_with.as_deref().map_or(true, |s| name.ends_with(s))
                    && contain.as_deref().map_or(true, |c| name.contains(c))
            })
            .map(|(_, value)| value.clone())
            .collect();

        Ok(Self {
            inner: EnumValidator::new(allowed),
        })
    }
}

impl Validate for ClassConstantsValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        self.inner.validate(value)
    }
}

// ============================================================================
// Object
// ============================================================================

/// Instance-of check. A `classname` containing `::` requires the exact
/// type path; a bare name matches any instance whose path ends with
/// `::name`.
#[derive(Debug)]
pub struct ObjectValidator {
    classname: String,
    is_absolute: bool,
}

impl ObjectValidator {
    /// Build from field tags (`classname`)
    pub fn from_tags(tags: &TagTable) -> Result<Self, SchemaError> {
        let classname = match tags.first("classname") {
            None => return Err(SchemaError::MissingTag("classname")),
            Some(Value::Str(name)) => name.clone(),
            Some(_) => {
                return Err(SchemaError::InvalidTag {
                    tag: "classname",
                    reason: "must be a string".to_string(),
                });
            }
        };
        let is_absolute = classname.contains("::");
        Ok(Self {
            classname,
            is_absolute,
        })
    }

    fn matches(&self, type_path: &str) -> bool {
        if self.is_absolute {
            type_path == self.classname
        } else {
            format!("::{type_path}").ends_with(&format!("::{}", self.classname))
        }
    }
}

impl Validate for ObjectValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        match value {
            Value::Instance(instance) if self.matches(instance.type_path()) => Ok(()),
            _ => Err(ValidationError::NotAnInstance {
                expected: self.classname.clone(),
                given: value.describe(),
            }),
        }
    }
}

// ============================================================================
// Email
// ============================================================================

/// Well-formed email address check. Does not coerce.
#[derive(Debug, Default)]
pub struct EmailValidator;

impl Validate for EmailValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        let valid = matches!(value, Value::Str(s) if EMAIL_REGEX.is_match(s));
        if !valid {
            return Err(ValidationError::InvalidEmail(value.describe()));
        }
        Ok(())
    }
}

// ============================================================================
// Ip
// ============================================================================

/// Well-formed IPv4/IPv6 literal check. Does not coerce.
#[derive(Debug, Default)]
pub struct IpValidator;

impl Validate for IpValidator {
    fn validate(&self, value: &mut Value) -> ValidationResult {
        let valid = matches!(value, Value::Str(s) if s.parse::<IpAddr>().is_ok());
        if !valid {
            return Err(ValidationError::InvalidIp(value.describe()));
        }
        Ok(())
    }
}
