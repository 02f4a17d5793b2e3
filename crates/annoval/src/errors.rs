//! Error types
//!
//! Two error kinds cover the whole crate: [`SchemaError`] for failures
//! while building a validator tree (bad or missing tags, unknown validator
//! names) and [`ValidationError`] for failures while checking a candidate
//! value against an already-built validator.

use thiserror::Error;

/// Result alias for validation checks
pub type ValidationResult<T = ()> = Result<T, ValidationError>;

// ============================================================================
// Schema Errors
// ============================================================================

/// Error raised while resolving tags into a validator.
///
/// Always fatal to the cache build for the entity type being resolved;
/// never retried.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The validator name resolves to neither a built-in nor a registered
    /// custom validator
    #[error("'{0}' does not name a validator")]
    UnknownValidator(String),

    /// A tag the validator requires is absent
    #[error("tag list must have a '{0}' tag")]
    MissingTag(&'static str),

    /// A required tag is present but its value has the wrong shape
    #[error("tag '{tag}' {reason}")]
    InvalidTag {
        /// Offending tag name
        tag: &'static str,
        /// What was expected of it
        reason: String,
    },

    /// A `regex` tag value failed to compile
    #[error("invalid regex '{pattern}'")]
    BadPattern {
        /// The pattern as written in the tag
        pattern: String,
        /// Compile error from the regex engine
        #[source]
        source: regex::Error,
    },

    /// `classconstants` named a type with no registered constants
    #[error("no constants registered for '{0}'")]
    UnknownConstants(String),
}

// ============================================================================
// Validation Errors
// ============================================================================

/// Error raised while checking a candidate value.
///
/// Fatal to the single write attempt; the field is left unmodified. Array
/// element failures wrap the child error with the offending key so the
/// full cause chain stays visible.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Value has the wrong type for the validator (or for its strict mode)
    #[error("{expected} expected, {given} given")]
    TypeMismatch {
        /// What the validator wanted
        expected: &'static str,
        /// Description of what it got
        given: String,
    },

    /// Value is an instance of the wrong type
    #[error("instance of [{expected}] expected, {given} given")]
    NotAnInstance {
        /// Expected type path or bare type name
        expected: String,
        /// Description of what was given
        given: String,
    },

    /// Numeric value below the configured minimum
    #[error("value must be greater or equal to '{min}', '{given}' given")]
    BelowMinimum {
        /// Configured minimum
        min: String,
        /// Offending value
        given: String,
    },

    /// Numeric value above the configured maximum
    #[error("value must be lower or equal to '{max}', '{given}' given")]
    AboveMaximum {
        /// Configured maximum
        max: String,
        /// Offending value
        given: String,
    },

    /// String shorter than the configured minimum length
    #[error("string value must contain at least {min} characters, it contains {len}")]
    TooShort {
        /// Configured minimum length
        min: usize,
        /// Actual length in characters
        len: usize,
    },

    /// String longer than the configured maximum length
    #[error("string value must contain at most {max} characters, it contains {len}")]
    TooLong {
        /// Configured maximum length
        max: usize,
        /// Actual length in characters
        len: usize,
    },

    /// String failed the configured pattern
    #[error("invalid value, must match the regex '{pattern}'")]
    PatternMismatch {
        /// The pattern as written in the tag
        pattern: String,
    },

    /// Write to an immutable field
    #[error("immutable field")]
    Immutable,

    /// Value is not a member of the allowed enum set
    #[error("unexpected value: {0}")]
    UnexpectedValue(String),

    /// Value is not a well-formed email address
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),

    /// Value is not a well-formed IPv4/IPv6 literal
    #[error("{0} is not a valid IP address")]
    InvalidIp(String),

    /// An array element failed its validator
    #[error("invalid array: key '{key}'")]
    Element {
        /// Index of the failing element
        key: String,
        /// The element's own failure
        #[source]
        source: Box<ValidationError>,
    },

    /// The entity has no field of this name
    #[error("undefined field '{0}'")]
    UnknownField(String),
}

impl ValidationError {
    /// Wrap this error as the failure of an array element
    pub fn at_key(self, key: impl Into<String>) -> Self {
        Self::Element {
            key: key.into(),
            source: Box::new(self),
        }
    }
}
