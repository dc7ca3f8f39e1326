//! Shared types for invoice editing
//!
//! Types used by both the edit engine and the HTTP client: invoice line
//! items, change events, stock adjustments, the save payload and the
//! unified error codes.

pub mod error;
pub mod invoice;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use serde::{Deserialize, Serialize};
