//! Error types for the Lumen editing engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gateway::GatewayError;

/// A shared error type for the entire engine.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum LumenError {
    /// A tool precondition was not met; no remote call was made.
    #[error("{0}")]
    Validation(String),

    /// An edit is already in flight. The caller must wait for it to finish.
    #[error("An edit is already in flight")]
    Busy,

    /// The session has no image at the history cursor.
    #[error("No image is loaded in the current session")]
    NoCurrentImage,

    /// A history index outside the current sequence.
    #[error("History index {index} is out of bounds (length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A display handle that is not (or no longer) registered.
    #[error("Display handle '{0}' is not registered")]
    UnknownHandle(String),

    /// Failure reported by the remote edit gateway.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Image decode/encode error
    #[error("Image processing error: {0}")]
    Image(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LumenError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Image error
    pub fn image(message: impl Into<String>) -> Self {
        Self::Image(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Busy refusal
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    /// Check if this is a Gateway failure
    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for LumenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

/// A type alias for `Result<T, LumenError>`.
pub type Result<T> = std::result::Result<T, LumenError>;
