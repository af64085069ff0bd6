//! Error types for newsdigest.

use thiserror::Error;

/// Common error type for newsdigest.
#[derive(Error, Debug)]
pub enum DigestError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Feed fetching or parsing error.
    #[error("feed error: {0}")]
    Feed(String),

    /// Language model request failed or returned unusable output.
    #[error("summarizer error: {0}")]
    Summarizer(String),

    /// Chat transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DigestError {
    fn from(e: sqlx::Error) -> Self {
        DigestError::Database(e.to_string())
    }
}

/// Result type alias for newsdigest operations.
pub type Result<T> = std::result::Result<T, DigestError>;
