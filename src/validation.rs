//! Validation of outbound data before it is encoded.
//!
//! Every serverbound packet implements [`Validate`]. The codec runs it before
//! serialization, so a value that fails is never written to the socket.
//!
//! Failures carry the dotted path of the first offending field:
//!
//! ```
//! use presence_ipc::validation::validate_text;
//!
//! let err = validate_text("details", "x").unwrap_err();
//! assert_eq!(err.field(), "details");
//! ```

use thiserror::Error;

/// Minimum number of characters for a display string.
pub const MIN_TEXT_LEN: usize = 2;

/// A value that can check its own protocol constraints.
pub trait Validate {
    /// Returns the first constraint violation, if any.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Why a field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// String shorter than [`MIN_TEXT_LEN`].
    TooShort { len: usize },
    /// Numeric identifier or timestamp below zero.
    Negative { value: i64 },
    /// Two fields that cannot be sent together.
    Exclusive { other: &'static str },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::TooShort { len } => write!(
                f,
                "must be at least {} characters, got {}",
                MIN_TEXT_LEN, len
            ),
            Violation::Negative { value } => write!(f, "must not be negative, got {}", value),
            Violation::Exclusive { other } => write!(f, "cannot be combined with `{}`", other),
        }
    }
}

/// A failed field with its path from the validated root.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{field}` {violation}")]
pub struct ValidationError {
    field: String,
    violation: Violation,
}

impl ValidationError {
    /// Create an error for a field.
    pub fn new(field: impl Into<String>, violation: Violation) -> Self {
        Self {
            field: field.into(),
            violation,
        }
    }

    /// Dotted path of the failing field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// The rule that was broken.
    pub fn violation(&self) -> &Violation {
        &self.violation
    }

    /// Prefix the field path with its parent, e.g. `label` -> `buttons[0].label`.
    pub fn within(mut self, parent: &str) -> Self {
        self.field = format!("{}.{}", parent, self.field);
        self
    }
}

/// Check a required display string.
pub fn validate_text(field: &str, value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < MIN_TEXT_LEN {
        return Err(ValidationError::new(field, Violation::TooShort { len }));
    }
    Ok(())
}

/// Check an optional display string; absence is allowed.
pub fn validate_optional_text(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(value) => validate_text(field, value),
        None => Ok(()),
    }
}

/// Check a numeric identifier or timestamp.
pub fn validate_non_negative(field: &str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(field, Violation::Negative { value }));
    }
    Ok(())
}

/// Validate a nested value, prefixing failures with `parent`.
pub fn validate_nested<T: Validate>(parent: &str, value: &T) -> Result<(), ValidationError> {
    value.validate().map_err(|e| e.within(parent))
}

/// Validate an optional nested value; absence is allowed.
pub fn validate_optional<T: Validate>(
    parent: &str,
    value: Option<&T>,
) -> Result<(), ValidationError> {
    match value {
        Some(value) => validate_nested(parent, value),
        None => Ok(()),
    }
}

/// Validate every item of a list, reporting the first failing index.
pub fn validate_each<T: Validate>(parent: &str, items: &[T]) -> Result<(), ValidationError> {
    for (i, item) in items.iter().enumerate() {
        validate_nested(&format!("{}[{}]", parent, i), item)?;
    }
    Ok(())
}
