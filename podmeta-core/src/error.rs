//! Core error types for Podmeta.

use thiserror::Error;

/// Core error type for Podmeta operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Image payload rejected before any request was made.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data from a model response.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}
