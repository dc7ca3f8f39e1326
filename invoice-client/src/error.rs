//! Client error types

use invoice_engine::CollaboratorError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a structured error envelope
    #[error("API error: {0}")]
    Api(AppError),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Base URL or request could not be built
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for CollaboratorError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_timeout() => CollaboratorError::Timeout(e.to_string()),
            ClientError::Http(e) if e.is_decode() => {
                CollaboratorError::InvalidResponse(e.to_string())
            }
            ClientError::Http(e) => CollaboratorError::Network(e.to_string()),
            ClientError::Api(app) if app.code == ErrorCode::InvoiceNotFound => {
                CollaboratorError::NotFound(app.message)
            }
            ClientError::Api(app) => CollaboratorError::Api(app),
            ClientError::Unauthorized => {
                CollaboratorError::Api(AppError::new(ErrorCode::NotAuthenticated))
            }
            ClientError::NotFound(what) => CollaboratorError::NotFound(what),
            ClientError::InvalidResponse(msg) => CollaboratorError::InvalidResponse(msg),
            ClientError::Serialization(e) => CollaboratorError::InvalidResponse(e.to_string()),
            ClientError::Config(msg) => {
                CollaboratorError::Api(AppError::with_message(ErrorCode::ConfigError, msg))
            }
        }
    }
}
