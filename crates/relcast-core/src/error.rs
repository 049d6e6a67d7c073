//! Error types for release copy operations.

use thiserror::Error;

/// Errors raised while copying releases between providers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Provider kind did not match any supported provider.
    #[error("{0:?} is unknown git provider! Must be \"github\" or \"gitlab\".")]
    UnknownProvider(String),

    /// Repository URL was not of the form `scheme://host/namespace/repo`.
    #[error("Invalid repository URL: {0:?}")]
    InvalidRepoUrl(String),

    /// Request could not be sent or the response could not be received.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body was not valid JSON where JSON was expected.
    #[error("Response parsing failed: {0}")]
    ResponseParse(String),

    /// Configured error path did not resolve against an error body.
    #[error("Error extraction failed: {0}")]
    Extraction(String),

    /// Release date did not match the provider's date format.
    #[error("Release date {value:?} does not match format {format:?}")]
    DateFormat {
        value: String,
        format: &'static str,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for release copy operations.
pub type Result<T> = std::result::Result<T, SyncError>;
