//! Invoice Client - HTTP collaborators for the invoice engine
//!
//! Implements invoice retrieval, supervisor PIN validation and save
//! submission against the invoice backend API.

pub mod api;
pub mod config;
pub mod error;
pub mod http;

pub use api::{InvoiceApiClient, PinCheckRequest, PinCheckResponse};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::HttpClient;

// Re-export shared types for convenience
pub use shared::ApiResponse;
