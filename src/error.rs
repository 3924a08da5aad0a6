//! Inguard error types.
//!
//! # Error Classification
//!
//! - **Validation**: malformed URL/email or oversized input. Surfaced to the
//!   caller synchronously and never retried.
//! - **Configuration**: a built-in pattern or rewrite table is incomplete or
//!   fails to compile. Raised once at startup by [`crate::Guard::new`].
//!
//! A detected injection is *not* an error. It is reported as a
//! [`crate::Verdict`] with `allowed == false` so callers can choose to block,
//! log, or degrade.
//!
//! Error messages never embed the caller's raw input, so they can be written
//! to logs without re-triggering the payload they describe.

use thiserror::Error;

/// Input rejected by one of the validators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// URL scheme is neither `https://` nor `http://localhost`.
    #[error("Only HTTPS or localhost URLs are allowed")]
    UnsupportedScheme,

    /// Input contains characters that are never valid in this context.
    #[error("Input contains dangerous characters")]
    DangerousCharacters,

    /// Domain contains Cyrillic or Greek code points.
    #[error("Potential homograph attack in domain")]
    HomographDomain,

    /// A `javascript:` scheme survived normalization.
    #[error("JavaScript URLs are not allowed")]
    JavascriptScheme,

    /// URL could not be parsed.
    #[error("Invalid URL structure: {0}")]
    MalformedUrl(String),

    /// Email does not have the `local@domain.tld` shape.
    #[error("Invalid email structure")]
    MalformedEmail,

    /// Input exceeds the configured scan size.
    #[error("Input exceeds max scan size: {len} > {max}")]
    InputTooLong {
        /// Input length in bytes.
        len: usize,
        /// Configured maximum in bytes.
        max: usize,
    },
}

/// Inguard errors.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration or built-in table error. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Inguard operations
pub type Result<T> = std::result::Result<T, GuardError>;

impl From<toml::de::Error> for GuardError {
    fn from(err: toml::de::Error) -> Self {
        GuardError::Configuration(err.to_string())
    }
}

impl From<url::ParseError> for ValidationError {
    fn from(err: url::ParseError) -> Self {
        ValidationError::MalformedUrl(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts_into_guard_error() {
        let err: GuardError = ValidationError::HomographDomain.into();
        assert!(matches!(
            err,
            GuardError::Validation(ValidationError::HomographDomain)
        ));
        assert!(err.to_string().contains("homograph"));
    }

    #[test]
    fn test_toml_error_is_configuration() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("= broken");
        let err: GuardError = parsed.unwrap_err().into();
        assert!(matches!(err, GuardError::Configuration(_)));
    }
}
