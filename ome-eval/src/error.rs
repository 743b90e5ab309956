//! Error types for ome-eval
//!
//! Missing inputs and schema mismatches are hard failures; nothing here is
//! retried or recovered.

use thiserror::Error;

/// Evaluation pipeline error type
#[derive(Debug, Error)]
pub enum EvalError {
    /// ome-common error (I/O, config, artifact codec)
    #[error("Common error: {0}")]
    Common(#[from] ome_common::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed XML in an alignment file
    #[error("XML error in {path}: {message}")]
    Xml { path: String, message: String },

    /// Well-formed XML that is not a usable alignment
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// Dataset CSV encoding or decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Missing or mismatched columns
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid hyperparameters or unusable training data
    #[error("Model error: {0}")]
    Model(String),

    /// Dataset content error
    #[error("Dataset error: {0}")]
    Dataset(String),
}

impl EvalError {
    /// Missing input file
    pub fn missing_file(path: &std::path::Path) -> Self {
        EvalError::Common(ome_common::Error::NotFound(path.display().to_string()))
    }
}

/// Result type for pipeline operations
pub type EvalResult<T> = Result<T, EvalError>;

/// Map any displayable error into an artifact codec error
pub(crate) fn codec_error(err: impl std::fmt::Display) -> ome_common::Error {
    ome_common::Error::Codec(err.to_string())
}
