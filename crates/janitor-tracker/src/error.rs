//! Typed errors for the tracking store and record codec

use crate::config::ConfigError;
use thiserror::Error;

/// Errors decoding a stored row into a [`Resource`](crate::Resource)
#[derive(Debug, Error)]
pub enum CodecError {
    /// The additionalFields blob is not a JSON object of strings
    #[error("malformed additionalFields JSON: {0}")]
    MalformedAttributes(#[source] serde_json::Error),

    /// An attribute value is a JSON array or object instead of a scalar
    #[error("additionalFields entry '{0}' is not a scalar value")]
    NonScalarAttribute(String),

    /// An identity column is NULL
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// The resourceType column holds a name this build does not know
    #[error("unknown resource type '{0}'")]
    UnknownResourceType(String),

    /// The state column holds a name this build does not know
    #[error("unknown cleanup state '{0}'")]
    UnknownState(String),
}

/// Errors surfaced by [`ResourceTracker`](crate::ResourceTracker) operations
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Additional fields could not be serialized; nothing was written
    #[error("failed to serialize additional fields of resource '{resource_id}': {source}")]
    Serialization {
        resource_id: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored row could not be decoded
    #[error("failed to decode resource row: {0}")]
    Decode(#[from] CodecError),

    /// More than one row exists for a key that must be unique
    #[error(
        "integrity violation: {count} rows for resource '{resource_id}' in region {}",
        region.as_deref().unwrap_or("<any>")
    )]
    IntegrityViolation {
        resource_id: String,
        region: Option<String>,
        count: usize,
    },

    /// A required argument was empty
    #[error("{0} cannot be empty")]
    InvalidArgument(&'static str),

    /// Invalid tracker configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Connection or statement failure in the backing database
    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),
}

impl TrackerError {
    /// Check if this is a duplicate-key integrity violation
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, TrackerError::IntegrityViolation { .. })
    }

    /// Check if this error came from the database itself
    pub fn is_backend(&self) -> bool {
        matches!(self, TrackerError::Backend(_))
    }
}

/// Result alias for tracker operations
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;
