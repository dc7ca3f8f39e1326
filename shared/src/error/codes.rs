//! Unified error codes for invoice editing
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Invoice edit errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Supervisor PIN rejected
    InvalidPin = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,

    // ==================== 4xxx: Invoice ====================
    /// Invoice not found
    InvoiceNotFound = 4001,
    /// Invoice line item not found
    InvoiceItemNotFound = 4002,
    /// Product already present on the invoice
    DuplicateInvoiceItem = 4003,
    /// Annulment toggle is not valid from the current state
    InvalidAnnulmentTransition = 4004,
    /// Another PIN check or save is in flight for this session
    SessionBusy = 4005,
    /// Session was already saved
    SessionClosed = 4006,
    /// Save submission was rejected by the server
    InvoiceSaveFailed = 4007,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Network error
    NetworkError = 9003,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether re-invoking the same operation with unchanged inputs may succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::InvalidPin
                | ErrorCode::SessionBusy
                | ErrorCode::InvoiceSaveFailed
                | ErrorCode::NetworkError
                | ErrorCode::TimeoutError
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidPin => "PIN was rejected, try again",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",

            // Invoice
            ErrorCode::InvoiceNotFound => "Invoice not found",
            ErrorCode::InvoiceItemNotFound => "Invoice line item not found",
            ErrorCode::DuplicateInvoiceItem => "Product is already on the invoice",
            ErrorCode::InvalidAnnulmentTransition => "Annulment cannot change from its current state",
            ErrorCode::SessionBusy => "Another operation is in progress for this invoice",
            ErrorCode::SessionClosed => "Invoice edit session is already saved",
            ErrorCode::InvoiceSaveFailed => "Invoice could not be saved",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1008 => Ok(ErrorCode::InvalidPin),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),

            // Invoice
            4001 => Ok(ErrorCode::InvoiceNotFound),
            4002 => Ok(ErrorCode::InvoiceItemNotFound),
            4003 => Ok(ErrorCode::DuplicateInvoiceItem),
            4004 => Ok(ErrorCode::InvalidAnnulmentTransition),
            4005 => Ok(ErrorCode::SessionBusy),
            4006 => Ok(ErrorCode::SessionClosed),
            4007 => Ok(ErrorCode::InvoiceSaveFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9003 => Ok(ErrorCode::NetworkError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
