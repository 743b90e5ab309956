//! Common error types for OME

use thiserror::Error;

/// Common result type for OME operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across OME crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested file or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input or parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Artifact could not be encoded or decoded in its on-disk format
    #[error("Codec error: {0}")]
    Codec(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
