//! Error types for Open House Lambda functions.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Open House Lambda functions.
#[derive(Error, Debug)]
pub enum Error {
    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed request (missing path parameter, unreadable body)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unsupported HTTP method
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) | Error::BadRequest(_) => 400,
            Error::NotFound(_) => 404,
            Error::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }

    /// Message safe to return to the caller.
    ///
    /// Server-side failures collapse to a generic message; the cause is logged instead.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::BadRequest(msg) | Error::NotFound(msg) => msg.clone(),
            Error::MethodNotAllowed(_) => "Method not allowed".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}
