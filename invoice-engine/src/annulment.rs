//! Annulment State Machine
//!
//! ```text
//!            begin()                confirm(authorizer)
//!   Off ───────────────▶ PendingPin ──────────────────▶ Confirmed
//!    ▲                       │                              │
//!    └──── abort() ──────────┘                              │
//!    └──────────────────────── revert() ────────────────────┘
//! ```
//!
//! Confirming records exactly one `factura_anulada` event; reverting removes
//! exactly that event. Aborting (PIN rejected, call failed, prompt abandoned)
//! leaves no trace. The machine never touches stock: reconciliation only reads
//! [`Annulment::is_confirmed`].

use crate::audit::AuditTrail;
use crate::error::{EditError, EditResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::invoice::{Authorizer, ChangeEvent, ChangeEventType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnulmentState {
    #[default]
    Off,
    PendingPin,
    Confirmed,
}

#[derive(Debug, Clone, Default)]
pub struct Annulment {
    state: AnnulmentState,
    /// Id of the recorded `factura_anulada` event while confirmed
    event_id: Option<String>,
}

impl Annulment {
    pub fn state(&self) -> AnnulmentState {
        self.state
    }

    /// The single signal reconciliation reads
    pub fn is_confirmed(&self) -> bool {
        self.state == AnnulmentState::Confirmed
    }

    /// Off -> PendingPin
    pub fn begin(&mut self) -> EditResult<()> {
        if self.state != AnnulmentState::Off {
            return Err(EditError::InvalidTransition {
                from: self.state,
                action: "request",
            });
        }
        self.state = AnnulmentState::PendingPin;
        Ok(())
    }

    /// PendingPin -> Confirmed, recording the annulment event
    pub fn confirm(
        &mut self,
        audit: &mut AuditTrail,
        invoice_number: &str,
        authorizer: &Authorizer,
    ) -> EditResult<ChangeEvent> {
        if self.state != AnnulmentState::PendingPin {
            return Err(EditError::InvalidTransition {
                from: self.state,
                action: "confirm",
            });
        }

        let description = match &authorizer.name {
            Some(name) => format!("Invoice {} voided, authorized by {}", invoice_number, name),
            None => format!("Invoice {} voided", invoice_number),
        };
        let event = ChangeEvent::new(
            ChangeEventType::InvoiceVoided,
            description,
            Some(json!({
                "invoiceNumber": invoice_number,
                "authorizerId": authorizer.id,
                "authorizerName": authorizer.name,
            })),
        );

        self.event_id = Some(event.id.clone());
        self.state = AnnulmentState::Confirmed;
        Ok(audit.record(event).clone())
    }

    /// PendingPin -> Off; no-op in any other state
    ///
    /// Returns whether a pending request was dropped.
    pub fn abort(&mut self) -> bool {
        if self.state == AnnulmentState::PendingPin {
            self.state = AnnulmentState::Off;
            true
        } else {
            false
        }
    }

    /// Confirmed -> Off, retracting the annulment event
    pub fn revert(&mut self, audit: &mut AuditTrail) -> EditResult<Option<ChangeEvent>> {
        if self.state != AnnulmentState::Confirmed {
            return Err(EditError::InvalidTransition {
                from: self.state,
                action: "revert",
            });
        }
        let retracted = self
            .event_id
            .take()
            .and_then(|id| audit.retract_annulment(&id));
        self.state = AnnulmentState::Off;
        Ok(retracted)
    }
}
