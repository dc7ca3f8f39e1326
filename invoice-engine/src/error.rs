//! Edit session errors

use crate::annulment::AnnulmentState;
use crate::collaborators::CollaboratorError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Errors returned by edit session operations
///
/// Every variant leaves the session in the state it had before the call.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("Line item not found: {0}")]
    ItemNotFound(i64),

    #[error("Product already on invoice: {0}")]
    DuplicateProduct(i64),

    #[error("Permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("Cannot {action} annulment while {from:?}")]
    InvalidTransition {
        from: AnnulmentState,
        action: &'static str,
    },

    #[error("Invoice is marked for annulment; revert it to keep editing")]
    AnnulmentConfirmed,

    #[error("PIN rejected")]
    PinRejected,

    #[error("Operation in progress: {0}")]
    SessionBusy(&'static str),

    #[error("Session already saved")]
    SessionClosed,

    #[error("Invalid invoice record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

pub type EditResult<T> = Result<T, EditError>;

impl From<EditError> for AppError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::ItemNotFound(id) => {
                AppError::new(ErrorCode::InvoiceItemNotFound).with_detail("product_id", id)
            }
            EditError::DuplicateProduct(id) => {
                AppError::new(ErrorCode::DuplicateInvoiceItem).with_detail("product_id", id)
            }
            EditError::PermissionDenied(capability) => {
                AppError::permission_denied(format!("Missing capability: {}", capability))
                    .with_detail("capability", capability)
            }
            EditError::InvalidTransition { from, action } => AppError::with_message(
                ErrorCode::InvalidAnnulmentTransition,
                format!("Cannot {} annulment while {:?}", action, from),
            ),
            e @ EditError::AnnulmentConfirmed => {
                AppError::with_message(ErrorCode::InvalidAnnulmentTransition, e.to_string())
            }
            EditError::PinRejected => AppError::new(ErrorCode::InvalidPin),
            EditError::SessionBusy(what) => AppError::new(ErrorCode::SessionBusy)
                .with_detail("in_flight", what),
            EditError::SessionClosed => AppError::new(ErrorCode::SessionClosed),
            EditError::InvalidRecord(msg) => AppError::validation(msg),
            EditError::Collaborator(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_rejected_is_retryable() {
        let app: AppError = EditError::PinRejected.into();
        assert_eq!(app.code, ErrorCode::InvalidPin);
        assert!(app.is_retryable());
    }

    #[test]
    fn test_transition_error_message() {
        let app: AppError = EditError::InvalidTransition {
            from: AnnulmentState::PendingPin,
            action: "revert",
        }
        .into();
        assert_eq!(app.code, ErrorCode::InvalidAnnulmentTransition);
        assert_eq!(app.message, "Cannot revert annulment while PendingPin");
    }

    #[test]
    fn test_network_failure_maps_to_retryable() {
        let app: AppError = EditError::from(CollaboratorError::Network("reset".into())).into();
        assert_eq!(app.code, ErrorCode::NetworkError);
        assert!(app.is_retryable());
    }
}
