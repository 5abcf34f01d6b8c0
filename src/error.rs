//! Error Handling Infrastructure
//!
//! This module defines the error type shared by the binder, the settings layer
//! and the CLI/MCP front ends. The rewriter itself never fails.
//! All errors map to stable error codes for JSON output.
//!
//! # Error Categories
//! - `InvalidInput`: Malformed CLI/MCP arguments (unreadable template, bad params JSON)
//! - `MissingParameters`: Placeholder names with no value in the parameter source
//! - `TemplateTooLarge`: Template exceeds the configured size limit
//! - `ConfigError`: Settings file errors

use thiserror::Error;

/// Main error type for namedsql operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamedSqlError {
    /// Invalid input or missing required arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// One or more placeholders could not be resolved at bind time
    #[error("Missing value for parameter(s): {}", .names.join(", "))]
    MissingParameters { names: Vec<String> },

    /// Template is longer than `max_template_bytes`
    #[error("Template is {len} bytes, limit is {limit}")]
    TemplateTooLarge { len: usize, limit: usize },

    /// Configuration error (file unreadable, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl NamedSqlError {
    /// Convert error to error code string for JSON output
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::MissingParameters { .. } => "MISSING_PARAMETER",
            Self::TemplateTooLarge { .. } => "TEMPLATE_TOO_LARGE",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Human-readable error message, safe to include in JSON output
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a missing parameters error
    pub fn missing_parameters<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingParameters { names: names.into_iter().map(Into::into).collect() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for namedsql operations
pub type Result<T> = std::result::Result<T, NamedSqlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(NamedSqlError::invalid_input("test").error_code(), "INVALID_INPUT");
        assert_eq!(NamedSqlError::missing_parameters(["id"]).error_code(), "MISSING_PARAMETER");
        assert_eq!(
            NamedSqlError::TemplateTooLarge { len: 10, limit: 5 }.error_code(),
            "TEMPLATE_TOO_LARGE"
        );
        assert_eq!(NamedSqlError::config_error("test").error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_missing_parameters_message_lists_names() {
        let err = NamedSqlError::missing_parameters(["email", "min_age"]);
        assert_eq!(err.message(), "Missing value for parameter(s): email, min_age");
    }

    #[test]
    fn test_template_too_large_message() {
        let err = NamedSqlError::TemplateTooLarge { len: 2048, limit: 1024 };
        assert!(err.message().contains("2048"));
        assert!(err.message().contains("1024"));
    }

    #[test]
    fn test_error_constructors() {
        let err = NamedSqlError::invalid_input("test");
        assert!(matches!(err, NamedSqlError::InvalidInput(_)));

        let err = NamedSqlError::config_error("test");
        assert!(matches!(err, NamedSqlError::ConfigError(_)));

        let err = NamedSqlError::missing_parameters(vec![String::from("x")]);
        assert_eq!(err, NamedSqlError::MissingParameters { names: vec!["x".to_string()] });
    }
}
