//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound | Self::InvoiceNotFound | Self::InvoiceItemNotFound => {
                StatusCode::NOT_FOUND
            }

            Self::AlreadyExists
            | Self::DuplicateInvoiceItem
            | Self::InvalidAnnulmentTransition
            | Self::SessionBusy
            | Self::SessionClosed => StatusCode::CONFLICT,

            Self::NotAuthenticated | Self::InvalidPin => StatusCode::UNAUTHORIZED,

            Self::PermissionDenied => StatusCode::FORBIDDEN,

            // Transient errors, client can retry
            Self::NetworkError | Self::TimeoutError | Self::InvoiceSaveFailed => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            Self::InternalError | Self::ConfigError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            _ => StatusCode::BAD_REQUEST,
        }
    }
}
