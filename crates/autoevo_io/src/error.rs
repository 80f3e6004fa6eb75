//! Error types for the autoevo_io crate.
//!
//! Covers save files, generation logs and the versioned archive layer.

use autoevo_core::AutoEvoError;
use thiserror::Error;

/// Main error type for autoevo_io operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Compression errors
    #[error("Compression error: {0}")]
    Compression(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored version is newer than this build understands.
    #[error("{kind} version {version} is newer than supported version {current}")]
    UnsupportedVersion {
        kind: &'static str,
        version: i32,
        current: i32,
    },

    /// Stored version is zero or negative.
    #[error("{kind} has invalid version {version}")]
    InvalidVersion { kind: &'static str, version: i32 },

    /// The history payload does not hash to the stored checksum.
    #[error("Checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    /// Not found errors
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The loaded data violates a history invariant.
    #[error("Core error: {0}")]
    Core(#[from] AutoEvoError),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

/// Result type alias for autoevo_io operations.
pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    /// Creates a new serialization error.
    #[must_use]
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a new validation error.
    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates a new not found error.
    #[must_use]
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound(resource.into())
    }

    /// Creates a new compression error.
    #[must_use]
    pub fn compression<S: Into<String>>(msg: S) -> Self {
        Self::Compression(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether the failure comes from a version tag rather than the payload.
    #[must_use]
    pub fn is_version_error(&self) -> bool {
        match self {
            Self::UnsupportedVersion { .. } | Self::InvalidVersion { .. } => true,
            Self::Context { source, .. } => source.is_version_error(),
            _ => false,
        }
    }
}
