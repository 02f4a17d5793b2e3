//! Annotation parser
//!
//! Scans a block of documentation text for `@name(...)` tags and collects
//! them into a [`TagTable`]. The grammar is deliberately permissive:
//! malformed bodies degrade to literal string values, never to an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::coerce::coerce;
use crate::value::Value;

// ============================================================================
// Pre-compiled Patterns
// ============================================================================

/// One `@name` occurrence with an optional parenthesized or bare body,
/// terminated by a newline or a doc-comment close.
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@(\w+)(?:\s*(?:\(\s*)?(.*?)(?:\s*\))?)??\s*(?:\n|\*/)").unwrap()
});

/// A `key = value` pair inside a tag body. The value is a bracketed list,
/// a double-quoted string, or a run of characters up to the next comma.
static PARAM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\w+)\s*=\s*(\[[^\]]*\]|"[^"]*"|[^,)]*)\s*(?:,|$)"#).unwrap()
});

// ============================================================================
// Tag Table
// ============================================================================

/// Parsed annotation tags for one field or class.
///
/// Tag names are lower-cased; repeated occurrences of the same tag
/// accumulate in declaration order, and the table itself keeps first-seen
/// tag order. Absence of a tag ("not specified") is distinct from a tag
/// with an empty value list. Fields carry a handful of tags, so lookups
/// scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagTable {
    tags: Vec<(String, Vec<Value>)>,
}

impl TagTable {
    /// Create an empty tag table
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, name: &str) -> Option<&Vec<Value>> {
        self.tags
            .iter()
            .find(|(tag, _)| tag == name)
            .map(|(_, values)| values)
    }

    fn entry_mut(&mut self, name: &str) -> &mut Vec<Value> {
        if let Some(index) = self.tags.iter().position(|(tag, _)| tag == name) {
            return &mut self.tags[index].1;
        }
        self.tags.push((name.to_string(), Vec::new()));
        &mut self.tags.last_mut().unwrap().1
    }

    /// Whether the tag is present at all
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// First value recorded for the tag
    pub fn first(&self, name: &str) -> Option<&Value> {
        self.entry(name).and_then(|values| values.first())
    }

    /// All values recorded for the tag, in declaration order
    pub fn values(&self, name: &str) -> Option<&[Value]> {
        self.entry(name).map(Vec::as_slice)
    }

    /// Append a value under the tag
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.entry_mut(&name.into()).push(value);
    }

    /// Replace the first value of the tag, creating it if absent
    pub fn set_first(&mut self, name: &str, value: Value) {
        let values = self.entry_mut(name);
        if values.is_empty() {
            values.push(value);
        } else {
            values[0] = value;
        }
    }

    /// Remove the tag entirely
    pub fn remove(&mut self, name: &str) {
        self.tags.retain(|(tag, _)| tag != name);
    }

    /// Number of distinct tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether no tags were found
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over tag names in first-seen order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|(tag, _)| tag.as_str())
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parse annotation text into a [`TagTable`].
///
/// Tag names are lower-cased. A tag without a body records `Bool(true)`
/// (presence-only flag). A body of `key = value` pairs records a
/// [`Value::Map`]; any other body coerces to a single scalar or list.
///
/// # Example
///
/// ```
/// use annoval::{parse, Value};
///
/// let tags = parse("/**\n * @var string\n * @minLength(3)\n */");
/// assert_eq!(tags.first("var"), Some(&Value::Str("string".into())));
/// assert_eq!(tags.first("minlength"), Some(&Value::Int(3)));
/// ```
pub fn parse(text: &str) -> TagTable {
    let mut table = TagTable::new();

    // A trailing newline lets a tag on the last line terminate.
    let mut haystack = text.to_string();
    haystack.push('\n');

    for caps in TAG_REGEX.captures_iter(&haystack) {
        let name = caps[1].to_lowercase();
        let value = match caps.get(2) {
            Some(body) => parse_body(body.as_str()),
            None => Value::Bool(true),
        };
        table.push(name, value);
    }

    table
}

/// Parse a tag body: named parameters first, then a single coerced value,
/// then the presence flag for an empty body.
fn parse_body(body: &str) -> Value {
    let mut params = Vec::new();
    for caps in PARAM_REGEX.captures_iter(body) {
        params.push((caps[1].to_string(), coerce(&caps[2])));
    }

    if !params.is_empty() {
        return Value::Map(params);
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        Value::Bool(true)
    } else {
        coerce(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_tag_is_flag() {
        let tags = parse("@strict\n");
        assert_eq!(tags.first("strict"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_parse_empty_parens_is_flag() {
        let tags = parse("@nullable()\n");
        assert_eq!(tags.first("nullable"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_parse_bare_body() {
        let tags = parse("@var string\n");
        assert_eq!(tags.first("var"), Some(&Value::Str("string".into())));
    }

    #[test]
    fn test_parse_parenthesized_body() {
        let tags = parse("@min(10)\n@regex(^\\d+$)\n");
        assert_eq!(tags.first("min"), Some(&Value::Int(10)));
        assert_eq!(tags.first("regex"), Some(&Value::Str("^\\d+$".into())));
    }

    #[test]
    fn test_parse_names_are_lowercased() {
        let tags = parse("@MinLength(3)\n");
        assert!(tags.contains("minlength"));
        assert!(!tags.contains("MinLength"));
    }

    #[test]
    fn test_parse_accumulates_in_order() {
        let tags = parse("@foo(1)\n@foo(1)\n@foo(2)\n");
        assert_eq!(
            tags.values("foo"),
            Some(&[Value::Int(1), Value::Int(1), Value::Int(2)][..])
        );
    }

    #[test]
    fn test_names_keep_first_seen_order() {
        let tags = parse("@var int\n@min(0)\n@max(9)\n@min(1)\n");
        let names: Vec<&str> = tags.names().collect();
        assert_eq!(names, vec!["var", "min", "max"]);

        let mut tags = TagTable::new();
        tags.push("b", Value::Int(1));
        tags.push("a", Value::Int(2));
        tags.remove("b");
        tags.push("b", Value::Int(3));
        let names: Vec<&str> = tags.names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_named_params() {
        let tags = parse("@range(min = 1, max = 10)\n");
        assert_eq!(
            tags.first("range"),
            Some(&Value::Map(vec![
                ("min".to_string(), Value::Int(1)),
                ("max".to_string(), Value::Int(10)),
            ]))
        );
    }

    #[test]
    fn test_parse_named_params_mixed_values() {
        let tags = parse("@opts(label = \"a b\", sizes = [1, 2], raw = x y)\n");
        assert_eq!(
            tags.first("opts"),
            Some(&Value::Map(vec![
                ("label".to_string(), Value::Str("a b".into())),
                (
                    "sizes".to_string(),
                    Value::List(vec![Value::Int(1), Value::Int(2)])
                ),
                ("raw".to_string(), Value::Str("x y".into())),
            ]))
        );
    }

    #[test]
    fn test_parse_doc_comment_block() {
        let text = "/**\n * The user's age.\n * @var integer\n * @min(0)\n * @max(150)\n */";
        let tags = parse(text);
        assert_eq!(tags.first("var"), Some(&Value::Str("integer".into())));
        assert_eq!(tags.first("min"), Some(&Value::Int(0)));
        assert_eq!(tags.first("max"), Some(&Value::Int(150)));
    }

    #[test]
    fn test_parse_tag_closed_by_comment_end() {
        let tags = parse("/** @var string */");
        assert_eq!(tags.first("var"), Some(&Value::Str("string".into())));
    }

    #[test]
    fn test_parse_tag_at_end_of_text() {
        let tags = parse("@var float");
        assert_eq!(tags.first("var"), Some(&Value::Str("float".into())));
    }

    #[test]
    fn test_parse_no_tags() {
        assert!(parse("just prose, judge@example.com is not a tag\n").len() <= 1);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_parse_never_fails_on_malformed_body() {
        // Unbalanced bracket degrades to a literal string, not an error.
        let tags = parse("@enum([a, b\n");
        assert!(tags.contains("enum"));
    }

    #[test]
    fn test_parse_list_body() {
        let tags = parse("@enum([\"red\", \"green\", \"blue\"])\n");
        assert_eq!(
            tags.first("enum"),
            Some(&Value::List(vec![
                Value::Str("red".into()),
                Value::Str("green".into()),
                Value::Str("blue".into()),
            ]))
        );
    }
}
