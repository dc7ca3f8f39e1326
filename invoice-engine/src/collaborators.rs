//! External collaborator contracts
//!
//! The engine never talks to a network or a stock store directly. It calls
//! these traits, which the HTTP client crate (or a test fake) implements.

use async_trait::async_trait;
use shared::error::{AppError, ErrorCode};
use shared::invoice::{Capabilities, InvoiceRecord, PinOutcome, SaveReceipt, SaveSubmission};
use std::sync::Arc;
use thiserror::Error;

/// Failure of a boundary call
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    /// Server answered with a structured error
    #[error("{0}")]
    Api(AppError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl CollaboratorError {
    /// Whether re-invoking the same call may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CollaboratorError::Network(_) | CollaboratorError::Timeout(_) => true,
            CollaboratorError::Api(app) => app.is_retryable(),
            CollaboratorError::NotFound(_) | CollaboratorError::InvalidResponse(_) => false,
        }
    }
}

impl From<CollaboratorError> for AppError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::NotFound(what) => {
                AppError::with_message(ErrorCode::InvoiceNotFound, format!("Not found: {}", what))
            }
            CollaboratorError::Network(msg) => AppError::network(msg),
            CollaboratorError::Timeout(msg) => AppError::with_message(ErrorCode::TimeoutError, msg),
            CollaboratorError::Api(app) => app,
            CollaboratorError::InvalidResponse(msg) => {
                AppError::with_message(ErrorCode::InvalidFormat, msg)
            }
        }
    }
}

/// Read-only invoice retrieval, called once per session
#[async_trait]
pub trait InvoiceSource: Send + Sync {
    async fn fetch_invoice(&self, invoice_number: &str) -> Result<InvoiceRecord, CollaboratorError>;
}

/// Supervisor PIN check; implementations must not cache or retry
#[async_trait]
pub trait PinValidator: Send + Sync {
    async fn validate_pin(&self, pin: &str) -> Result<PinOutcome, CollaboratorError>;
}

/// Persistence collaborator: applies adjustments and the invoice transition atomically
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(
        &self,
        invoice_number: &str,
        submission: &SaveSubmission,
    ) -> Result<SaveReceipt, CollaboratorError>;
}

/// Permission policy, consulted once when the session opens
pub trait CapabilityPolicy: Send + Sync {
    fn capabilities(&self) -> Capabilities;
}

impl CapabilityPolicy for Capabilities {
    fn capabilities(&self) -> Capabilities {
        *self
    }
}

/// The collaborators an edit session is wired to
#[derive(Clone)]
pub struct Collaborators {
    pub invoices: Arc<dyn InvoiceSource>,
    pub pins: Arc<dyn PinValidator>,
    pub submissions: Arc<dyn SubmissionSink>,
    pub policy: Arc<dyn CapabilityPolicy>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("invoices", &"<InvoiceSource>")
            .field("pins", &"<PinValidator>")
            .field("submissions", &"<SubmissionSink>")
            .field("policy", &self.policy.capabilities())
            .finish()
    }
}
