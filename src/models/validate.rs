//! Schema validation for persisted and incoming records.
//!
//! Decoding never panics or throws: malformed JSON and out-of-range fields
//! both come back as a `ValidationError` the caller can act on.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use thiserror::Error;

static CLOCK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    // 24-hour "HH:MM"
    Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$")
        .unwrap_or_else(|e| panic!("Invalid clock regex: {e}"))
});

/// A record failed schema validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Offending field (or `json` for undecodable input)
    pub field: String,
    /// What was wrong with it
    pub reason: String,
}

impl ValidationError {
    /// Create a validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Records that can check their own invariants.
pub trait Validate {
    /// Check the record.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for String {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for bool {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl Validate for serde_json::Value {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.as_ref().map_or(Ok(()), Validate::validate)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        self.iter().try_for_each(Validate::validate)
    }
}

/// Decode JSON text into a validated record.
///
/// # Errors
///
/// Returns a `ValidationError` on field `json` if the text does not decode,
/// or the record's own error if it decodes but is invalid.
pub fn decode<T: DeserializeOwned + Validate>(raw: &str) -> Result<T, ValidationError> {
    let value: T =
        serde_json::from_str(raw).map_err(|e| ValidationError::new("json", e.to_string()))?;
    value.validate()?;
    Ok(value)
}

/// Decode an already-parsed JSON value into a validated record.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_value<T: DeserializeOwned + Validate>(
    value: serde_json::Value,
) -> Result<T, ValidationError> {
    let value: T =
        serde_json::from_value(value).map_err(|e| ValidationError::new("json", e.to_string()))?;
    value.validate()?;
    Ok(value)
}

/// Check a 24-hour `HH:MM` clock time.
///
/// # Errors
///
/// Returns a `ValidationError` naming `field` if the format is wrong.
pub fn check_clock(field: &str, value: &str) -> Result<(), ValidationError> {
    if CLOCK_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("expected HH:MM, got {value:?}"),
        ))
    }
}
