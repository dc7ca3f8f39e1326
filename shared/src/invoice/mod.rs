//! Invoice edit domain types
//!
//! - **types**: line items, edit inputs, retrieval records, totals, capabilities
//! - **event**: audit trail change events
//! - **adjustment**: stock adjustment instructions
//! - **submission**: save payload sent to the persistence collaborator

pub mod adjustment;
pub mod event;
pub mod submission;
pub mod types;

pub use adjustment::{StockAdjustment, StockDirection};
pub use event::{ChangeEvent, ChangeEventType, FieldChange};
pub use submission::{SaveReceipt, SaveSubmission};
pub use types::{
    Authorizer, Capabilities, InvoiceLineRecord, InvoiceRecord, InvoiceTotals, LineChanges,
    LineItem, PinOutcome, ProductRef, TaxMode,
};
