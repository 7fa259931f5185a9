//! Error types for settings loading and body access

use thiserror::Error;

use crate::sim::BodyKey;

/// Errors reported by the engine
#[derive(Debug, Error)]
pub enum LedgeError {
    /// Settings failed validation
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be parsed
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    /// Settings file could not be read
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// Handle does not name a registered body
    #[error("Body not registered: {0:?}")]
    UnknownBody(BodyKey),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, LedgeError>;
