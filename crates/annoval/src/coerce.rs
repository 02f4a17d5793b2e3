//! Scalar/array coercion of raw annotation tokens
//!
//! Turns the text captured for an annotation body (or one of its pieces)
//! into a typed [`Value`]. Coercion is total: text that fits no other rule
//! stays a string, nothing is rejected.

use crate::value::Value;

/// Coerce a raw text token into a typed value.
///
/// Rules, in order:
/// - `[a, b, c]` splits the interior on commas and coerces each element;
/// - `"..."` strips the quotes and re-coerces the interior (so `"123"`
///   still becomes the integer 123);
/// - `true`/`false` (case-insensitive) become booleans;
/// - numeric text becomes an integer when it parses as one, a float
///   otherwise;
/// - anything else is kept as the trimmed string.
///
/// # Example
///
/// ```
/// use annoval::{coerce, Value};
///
/// assert_eq!(coerce("[1, 2, 3]"), Value::List(vec![
///     Value::Int(1), Value::Int(2), Value::Int(3),
/// ]));
/// assert_eq!(coerce("TRUE"), Value::Bool(true));
/// assert_eq!(coerce("3.0"), Value::Float(3.0));
/// assert_eq!(coerce("3"), Value::Int(3));
/// ```
pub fn coerce(raw: &str) -> Value {
    let val = raw.trim();

    if val.len() >= 2 && val.starts_with('[') && val.ends_with(']') {
        // list: simple split on commas, each piece coerced recursively
        let inner = &val[1..val.len() - 1];
        return Value::List(inner.split(',').map(coerce).collect());
    }

    if val.len() >= 2 && val.starts_with('"') && val.ends_with('"') {
        // quoted value: strip quotes and re-coerce the interior
        return coerce(&val[1..val.len() - 1]);
    }

    if val.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }

    if val.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if let Some(number) = coerce_number(val) {
        return number;
    }

    Value::Str(val.to_string())
}

/// Numeric coercion: integer when the literal is one, float otherwise.
fn coerce_number(val: &str) -> Option<Value> {
    let first = val.chars().next()?;
    if !(first.is_ascii_digit() || first == '+' || first == '-' || first == '.') {
        return None;
    }

    if let Ok(i) = val.parse::<i64>() {
        return Some(Value::Int(i));
    }

    val.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}
