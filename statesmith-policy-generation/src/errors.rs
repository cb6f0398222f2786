//! Error types for policy generation.

use thiserror::Error;

/// Errors that can occur while validating configuration or generating
/// policy documents.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// A configuration field holds a value outside its allowed set or range.
    ///
    /// Raised before any document is generated; the message names the
    /// allowed values so the caller can fix the field without consulting
    /// documentation.
    #[error("Invalid value for `{field}`: {message}")]
    ConfigurationValidation {
        /// The offending configuration field.
        field: String,
        /// What the field allows.
        message: String,
    },

    /// A principal pattern could not be compiled into a matcher.
    #[error("Invalid principal pattern {pattern:?}")]
    PatternCompile {
        /// The pattern as supplied by the caller.
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A policy document failed to serialize.
    #[error("Failed to serialize policy document")]
    Serialization(#[from] serde_json::Error),
}

impl PolicyError {
    /// Create a configuration validation error for a named field.
    pub fn configuration_validation(
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ConfigurationValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, PolicyError>;
