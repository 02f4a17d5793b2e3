//! Runtime value model
//!
//! This module defines the dynamic `Value` type shared by the annotation
//! parser (tag values) and the validators (candidate field values).

// ============================================================================
// Value Enum
// ============================================================================

/// A dynamically typed value.
///
/// Annotation bodies parse into `Value`s, and field writes are validated as
/// `Value`s. `Map` holds named annotation parameters (`key = value` pairs)
/// as well as plain key-value data; `Instance` stands in for "an object of
/// some host type" and carries only its type path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (i64)
    Int(i64),
    /// Float value (f64)
    Float(f64),
    /// String value
    Str(String),
    /// List of values
    List(Vec<Value>),
    /// Named values (insertion order preserved)
    Map(Vec<(String, Value)>),
    /// Instance of a host type
    Instance(Instance),
}

impl Value {
    /// Get human-readable type name for error messages
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "array",
            Self::Map(_) => "map",
            Self::Instance(instance) => instance.type_path(),
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if value is a scalar (bool, int, float or string)
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Str(_)
        )
    }

    /// Truthiness of the value.
    ///
    /// `0`, `0.0`, the empty string, `"0"`, the empty list/map and `Null`
    /// are false; everything else is true.
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty() && s != "0",
            Self::List(items) => !items.is_empty(),
            Self::Map(entries) => !entries.is_empty(),
            Self::Instance(_) => true,
        }
    }

    /// Coerce to an integer, if the value is numeric-compatible.
    ///
    /// Booleans map to 0/1, floats truncate toward zero, strings must
    /// parse as a number. Returns `None` for everything else.
    pub fn coerce_int(&self) -> Option<i64> {
        match self {
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Int(i) => Some(*i),
            Self::Float(f) => Some(*f as i64),
            Self::Str(s) => parse_number(s).map(|f| f as i64),
            _ => None,
        }
    }

    /// Coerce to a float, if the value is numeric-compatible.
    pub fn coerce_float(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Str(s) => parse_number(s),
            _ => None,
        }
    }

    /// Coerce to a string. Only scalars have a string form.
    pub fn coerce_string(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Describe the value for error messages: `[type] 'value'` for
    /// scalars, `[type]` otherwise.
    pub fn describe(&self) -> String {
        match self.coerce_string() {
            Some(s) if self.is_scalar() => format!("[{}] '{}'", self.type_name(), s),
            _ => format!("[{}]", self.type_name()),
        }
    }
}

/// Parse a numeric string. Rejects infinities and NaN spellings that
/// `f64::from_str` would otherwise accept.
fn parse_number(s: &str) -> Option<f64> {
    let first = s.chars().next()?;
    if !(first.is_ascii_digit() || first == '+' || first == '-' || first == '.') {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

// ============================================================================
// Instance
// ============================================================================

/// A value standing in for an object of some host type.
///
/// `type_path` is a `::`-separated path, e.g. `app::model::User`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instance {
    type_path: String,
}

impl Instance {
    /// Create an instance value of the given type path
    pub fn new(type_path: impl Into<String>) -> Self {
        Self {
            type_path: type_path.into(),
        }
    }

    /// Full type path of the instance
    pub fn type_path(&self) -> &str {
        &self.type_path
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Self::Instance(instance)
    }
}

#[cfg(feature = "serde")]
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            Value::Instance(instance) => {
                serde_json::Value::String(instance.type_path().to_string())
            }
        }
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::MAX))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(entries) => {
                Value::Map(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
