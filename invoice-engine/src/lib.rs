//! Invoice Engine - edit and void issued invoices
//!
//! # Overview
//!
//! An edit session loads an issued invoice, lets the operator change its
//! lines, and on save turns the difference into inventory stock adjustments.
//! Voiding is gated behind a supervisor PIN.
//!
//! - **Snapshot store** (`snapshot`): frozen original plus mutable working set
//! - **Editor** (`session`): add/update/remove lines, general discount, client
//! - **Totals** (`money`): decimal line and invoice totals, inclusive or legacy tax
//! - **Audit trail** (`audit`): append-only change events
//! - **Annulment** (`annulment`): `Off -> PendingPin -> Confirmed` state machine
//! - **Reconciliation** (`reconcile`): original vs working set into stock adjustments
//!
//! # Module Layout
//!
//! ```text
//! invoice-engine/src/
//! ├── core/           # EngineConfig
//! ├── session/        # EditSession, SessionHandle
//! ├── utils/          # logger, environment setup
//! ├── annulment.rs
//! ├── audit.rs
//! ├── collaborators.rs # InvoiceSource, PinValidator, SubmissionSink, CapabilityPolicy
//! ├── error.rs
//! ├── money.rs
//! ├── reconcile.rs
//! └── snapshot.rs
//! ```

pub mod annulment;
pub mod audit;
pub mod collaborators;
pub mod core;
pub mod error;
pub mod money;
pub mod reconcile;
pub mod session;
pub mod snapshot;
pub mod utils;

pub use annulment::AnnulmentState;
pub use audit::AuditTrail;
pub use collaborators::{
    CapabilityPolicy, CollaboratorError, Collaborators, InvoiceSource, PinValidator,
    SubmissionSink,
};
pub use crate::core::EngineConfig;
pub use error::{EditError, EditResult};
pub use reconcile::reconcile;
pub use session::{EditSession, InFlight, SaveOutcome, SessionHandle, SessionNotice};
pub use snapshot::{InvoiceSnapshot, WorkingSet};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger_with_file};
pub use utils::setup_environment;
