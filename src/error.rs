//! Crate-level error types.
//!
//! Collaborator failures are not represented here: the [`Vehicle`] and
//! [`AudioOutput`] traits carry their own associated `Error` types, which the
//! controllers pass through unchanged.
//!
//! [`Vehicle`]: crate::traits::Vehicle
//! [`AudioOutput`]: crate::traits::AudioOutput

/// Result type alias for configuration operations.
pub type Result<T> = core::result::Result<T, ConfigError>;

/// Configuration rejected by [`Config::validate`] or the JSON decoder.
///
/// [`Config::validate`]: crate::config::Config::validate
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was zero or negative.
    #[error("{field} must be positive, got {value}")]
    NotPositive {
        /// Name of the offending field.
        field: &'static str,
        /// Value found.
        value: f32,
    },

    /// A value that must not be negative was below zero.
    #[error("{field} must not be negative, got {value}")]
    Negative {
        /// Name of the offending field.
        field: &'static str,
        /// Value found.
        value: f32,
    },

    /// A `[min, max]` pair is inverted.
    #[error("{field}: minimum {min} exceeds maximum {max}")]
    InvertedRange {
        /// Name of the offending range.
        field: &'static str,
        /// Lower bound found.
        min: f32,
        /// Upper bound found.
        max: f32,
    },

    /// Speed profile thresholds are not strictly decreasing.
    #[error("speed profile distances must be strictly decreasing")]
    UnorderedProfile,

    /// JSON input could not be decoded.
    #[cfg(feature = "serde-json-core")]
    #[error("invalid config JSON: {0:?}")]
    Json(serde_json_core::de::Error),
}
