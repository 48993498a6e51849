//! Error types for overlay-config.

use std::fmt;

/// Result type alias for overlay-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when working with configuration.
///
/// Only [`ConfigError::LoadError`] and [`ConfigError::UnknownProperties`] are
/// raised while a pipeline is assembled. Everything else comes from the typed
/// accessors on [`Config`](crate::core::Config), which translate the data
/// returned by the resolution chain into errors at the outermost API.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration source could not be constructed or read.
    #[error("Failed to load configuration source '{source_name}': {reason}")]
    LoadError {
        /// Name of the source that failed
        source_name: String,
        /// What went wrong
        reason: String,
    },

    /// No source defines the requested name.
    #[error("Configuration property '{0}' not found")]
    NotFound(String),

    /// The raw value could not be converted to the requested type.
    #[error("Failed to convert '{value}' for property '{name}': {reason}")]
    ConversionError {
        /// Property name
        name: String,
        /// Raw value that failed to convert
        value: String,
        /// Converter message
        reason: String,
    },

    /// An expression inside the value could not be expanded.
    #[error("Failed to expand expression in property '{name}': {reason}")]
    ExpressionError {
        /// Property name
        name: String,
        /// What could not be expanded
        reason: String,
    },

    /// The property is a secret and the lookup did not unlock secrets.
    #[error("Not allowed to access secret property '{0}'")]
    SecretAccessDenied(String),

    /// Failed to deserialize a materialized mapping.
    #[error("Failed to deserialize configuration: {0}")]
    DeserializationError(String),

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    /// Names under a mapping prefix that the mapping does not declare.
    #[error("Unknown configuration properties: {}", .0.join(", "))]
    UnknownProperties(Vec<String>),
}

impl ConfigError {
    pub(crate) fn load(source_name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::LoadError {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Validation error for configuration validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
