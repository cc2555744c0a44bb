//! Error types for the boostlink adapter.
//!
//! This module provides structured error handling using thiserror. Errors
//! never cross the native callback boundary: the session layer logs them and
//! turns them into a stop signal.

use thiserror::Error;

/// Main error type for boostlink operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Structural violation in an inspected image, or I/O failure while reading it
    #[error("Malformed image: {reason}")]
    MalformedImage {
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// File I/O errors outside of image inspection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be applied
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filter rule failed to compile
    #[error("Invalid filter rule: {0}")]
    InvalidFilter(#[from] regex::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The engine referred to a test that discovery never produced
    #[error("Test not found: {id}")]
    UnknownTest { id: String },

    /// The engine broke the callback nesting discipline
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// Native bridge library could not be loaded or resolved
    #[error("Bridge error: {0}")]
    Bridge(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Structural failure without an underlying I/O cause.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedImage {
            reason: reason.into(),
            source: None,
        }
    }

    /// I/O failure while reading an image; reported as malformed.
    pub fn truncated(reason: impl Into<String>, source: std::io::Error) -> Self {
        Self::MalformedImage {
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Whether this error means the inspected file is not a usable image.
    pub fn is_malformed_image(&self) -> bool {
        matches!(self, Self::MalformedImage { .. })
    }
}

/// Result type alias for boostlink operations
pub type Result<T> = std::result::Result<T, BridgeError>;
