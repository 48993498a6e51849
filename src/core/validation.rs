//! Validation of materialized mappings.

use crate::error::ValidationError;

/// Checks a materialized mapping beyond what its types express.
///
/// Used by [`Config::get_validated_mapping`](crate::core::Config::get_validated_mapping)
/// after deserialization succeeds.
///
/// # Examples
///
/// ```rust
/// use overlay_config::core::Validate;
/// use overlay_config::error::ValidationError;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// #[serde(rename_all = "kebab-case")]
/// struct Pool {
///     min_size: usize,
///     max_size: usize,
/// }
///
/// impl Validate for Pool {
///     fn validate(&self) -> Result<(), ValidationError> {
///         if self.max_size == 0 {
///             return Err(ValidationError::invalid_field("max-size", "must be greater than 0"));
///         }
///         if self.min_size > self.max_size {
///             return Err(ValidationError::invalid_field("min-size", "must not exceed max-size"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validate {
    /// Validate the mapping.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the offending member.
    fn validate(&self) -> Result<(), ValidationError>;
}
