//! Shared handle over an edit session
//!
//! Editor operations run under one lock and never suspend. PIN validation and
//! save suspend on a collaborator call; while one is in flight the session is
//! busy and every other operation returns [`EditError::SessionBusy`]. The busy
//! mark is held by an RAII guard, so dropping the future mid-call releases it
//! and abandons a pending annulment.

use super::EditSession;
use crate::annulment::AnnulmentState;
use crate::collaborators::{Collaborators, PinValidator, SubmissionSink};
use crate::error::{EditError, EditResult};
use parking_lot::Mutex;
use shared::invoice::{
    ChangeEvent, InvoiceTotals, LineChanges, LineItem, PinOutcome, ProductRef, SaveReceipt,
    SaveSubmission, StockAdjustment, TaxMode,
};
use std::sync::Arc;
use tokio::sync::broadcast;

const NOTICE_CHANNEL_CAPACITY: usize = 256;

/// Suspending operation currently holding the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlight {
    PinValidation,
    Save,
}

impl InFlight {
    pub(crate) const fn label(self) -> &'static str {
        match self {
            InFlight::PinValidation => "pin validation",
            InFlight::Save => "save",
        }
    }
}

/// Broadcast to subscribers after each applied change
#[derive(Debug, Clone)]
pub enum SessionNotice {
    /// An event was appended to the audit trail
    Changed(ChangeEvent),
    /// The annulment event was removed from the audit trail
    Retracted(ChangeEvent),
    Annulment(AnnulmentState),
    Saved(SaveReceipt),
    /// Save failed; the session is unchanged and may retry
    SaveFailed { message: String, retryable: bool },
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub receipt: SaveReceipt,
    pub submission: SaveSubmission,
}

struct SessionState {
    session: EditSession,
    in_flight: Option<InFlight>,
}

impl SessionState {
    fn ensure_idle(&self) -> EditResult<()> {
        match self.in_flight {
            Some(kind) => Err(EditError::SessionBusy(kind.label())),
            None => Ok(()),
        }
    }
}

/// Clears the busy mark on drop; a pending PIN request is abandoned
struct InFlightGuard {
    state: Arc<Mutex<SessionState>>,
    notices: broadcast::Sender<SessionNotice>,
    kind: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let abandoned = {
            let mut state = self.state.lock();
            state.in_flight = None;
            self.kind == InFlight::PinValidation && state.session.abort_annulment()
        };
        if abandoned {
            tracing::info!("Annulment request abandoned, back to off");
            let _ = self
                .notices
                .send(SessionNotice::Annulment(AnnulmentState::Off));
        }
    }
}

/// Cloneable handle to one edit session
#[derive(Clone)]
pub struct SessionHandle {
    state: Arc<Mutex<SessionState>>,
    notices: broadcast::Sender<SessionNotice>,
    pins: Arc<dyn PinValidator>,
    submissions: Arc<dyn SubmissionSink>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SessionHandle")
            .field("invoice_number", &state.session.invoice_number())
            .field("in_flight", &state.in_flight)
            .finish()
    }
}

impl SessionHandle {
    /// Retrieve the invoice, resolve capabilities and open a session
    pub async fn open(
        invoice_number: &str,
        collaborators: Collaborators,
        tax_mode: TaxMode,
    ) -> EditResult<Self> {
        let record = collaborators.invoices.fetch_invoice(invoice_number).await?;
        let capabilities = collaborators.policy.capabilities();
        let session = EditSession::open(record, capabilities, tax_mode)?;
        Ok(Self::new(
            session,
            collaborators.pins,
            collaborators.submissions,
        ))
    }

    pub fn new(
        session: EditSession,
        pins: Arc<dyn PinValidator>,
        submissions: Arc<dyn SubmissionSink>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState {
                session,
                in_flight: None,
            })),
            notices,
            pins,
            submissions,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices.subscribe()
    }

    fn notify(&self, notice: SessionNotice) {
        if self.notices.send(notice).is_err() {
            tracing::trace!("No session subscribers");
        }
    }

    fn guard(&self, kind: InFlight) -> InFlightGuard {
        InFlightGuard {
            state: Arc::clone(&self.state),
            notices: self.notices.clone(),
            kind,
        }
    }

    /// Run a synchronous operation unless a suspending call is in flight
    fn with_idle<T>(&self, op: impl FnOnce(&mut EditSession) -> EditResult<T>) -> EditResult<T> {
        let mut state = self.state.lock();
        state.ensure_idle()?;
        op(&mut state.session)
    }

    /// Inspect the session under the lock
    pub fn read<T>(&self, f: impl FnOnce(&EditSession) -> T) -> T {
        f(&self.state.lock().session)
    }

    // ========== Queries ==========

    pub fn invoice_number(&self) -> String {
        self.read(|s| s.invoice_number().to_string())
    }

    pub fn items(&self) -> Vec<LineItem> {
        self.read(|s| s.items().to_vec())
    }

    pub fn totals(&self) -> InvoiceTotals {
        self.read(|s| s.totals().clone())
    }

    pub fn audit_trail(&self) -> Vec<ChangeEvent> {
        self.read(|s| s.audit_trail().events().to_vec())
    }

    pub fn annulment_state(&self) -> AnnulmentState {
        self.read(|s| s.annulment_state())
    }

    pub fn stock_adjustments(&self) -> Vec<StockAdjustment> {
        self.read(|s| s.stock_adjustments())
    }

    pub fn in_flight(&self) -> Option<InFlight> {
        self.state.lock().in_flight
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight().is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.read(|s| s.is_closed())
    }

    // ========== Editor ==========

    pub fn add_item(&self, product: ProductRef, quantity: i32) -> EditResult<ChangeEvent> {
        let event = self.with_idle(|s| s.add_item(product, quantity))?;
        self.notify(SessionNotice::Changed(event.clone()));
        Ok(event)
    }

    pub fn update_item(&self, product_id: i64, changes: LineChanges) -> EditResult<Vec<ChangeEvent>> {
        let events = self.with_idle(|s| s.update_item(product_id, changes))?;
        for event in &events {
            self.notify(SessionNotice::Changed(event.clone()));
        }
        Ok(events)
    }

    pub fn remove_item(&self, product_id: i64) -> EditResult<ChangeEvent> {
        let event = self.with_idle(|s| s.remove_item(product_id))?;
        self.notify(SessionNotice::Changed(event.clone()));
        Ok(event)
    }

    pub fn set_general_discount(&self, percent: f64) -> EditResult<Option<ChangeEvent>> {
        let event = self.with_idle(|s| s.set_general_discount(percent))?;
        if let Some(event) = &event {
            self.notify(SessionNotice::Changed(event.clone()));
        }
        Ok(event)
    }

    pub fn set_client(&self, client_id: Option<i64>) -> EditResult<Option<ChangeEvent>> {
        let event = self.with_idle(|s| s.set_client(client_id))?;
        if let Some(event) = &event {
            self.notify(SessionNotice::Changed(event.clone()));
        }
        Ok(event)
    }

    // ========== Annulment ==========

    /// Mark the invoice for annulment after a supervisor PIN check
    ///
    /// On rejection, transport failure or cancellation the state returns to
    /// `Off` with no audit trace. The PIN is never retained.
    pub async fn request_annulment(&self, pin: &str) -> EditResult<ChangeEvent> {
        let guard = {
            let mut state = self.state.lock();
            state.ensure_idle()?;
            state.session.begin_annulment()?;
            state.in_flight = Some(InFlight::PinValidation);
            self.guard(InFlight::PinValidation)
        };
        self.notify(SessionNotice::Annulment(AnnulmentState::PendingPin));

        let result = match self.pins.validate_pin(pin).await {
            Ok(PinOutcome::Authorized(authorizer)) => {
                let mut state = self.state.lock();
                state.session.confirm_annulment(&authorizer)
            }
            Ok(PinOutcome::Rejected) => {
                tracing::warn!("Annulment PIN rejected");
                Err(EditError::PinRejected)
            }
            Err(e) => {
                tracing::warn!(error = %e, "PIN validation failed");
                Err(e.into())
            }
        };
        drop(guard);

        if let Ok(event) = &result {
            self.notify(SessionNotice::Annulment(AnnulmentState::Confirmed));
            self.notify(SessionNotice::Changed(event.clone()));
        }
        result
    }

    /// Confirmed -> Off, removing the annulment event
    pub fn revert_annulment(&self) -> EditResult<Option<ChangeEvent>> {
        let retracted = self.with_idle(|s| s.revert_annulment())?;
        self.notify(SessionNotice::Annulment(AnnulmentState::Off));
        if let Some(event) = &retracted {
            self.notify(SessionNotice::Retracted(event.clone()));
        }
        Ok(retracted)
    }

    // ========== Save ==========

    /// Submit the edit (or void) to the persistence collaborator
    ///
    /// A failed save leaves the session untouched so the caller can retry.
    /// A successful save closes the session.
    pub async fn save(&self) -> EditResult<SaveOutcome> {
        let (guard, invoice_number, submission) = {
            let mut state = self.state.lock();
            state.ensure_idle()?;
            let submission = state.session.prepare_submission()?;
            let invoice_number = state.session.invoice_number().to_string();
            state.in_flight = Some(InFlight::Save);
            (self.guard(InFlight::Save), invoice_number, submission)
        };

        tracing::info!(
            invoice_number = %invoice_number,
            es_anulada = submission.es_anulada,
            adjustments = submission.stock_adjustments.len(),
            events = submission.audit_trail.len(),
            "Submitting invoice edit"
        );

        match self.submissions.submit(&invoice_number, &submission).await {
            Ok(receipt) => {
                self.state.lock().session.mark_saved();
                drop(guard);
                tracing::info!(invoice_number = %invoice_number, "Invoice edit saved");
                self.notify(SessionNotice::Saved(receipt.clone()));
                Ok(SaveOutcome {
                    receipt,
                    submission,
                })
            }
            Err(e) => {
                drop(guard);
                let err = EditError::from(e);
                let retryable = matches!(&err, EditError::Collaborator(c) if c.is_retryable());
                tracing::warn!(invoice_number = %invoice_number, error = %err, "Invoice save failed");
                self.notify(SessionNotice::SaveFailed {
                    message: err.to_string(),
                    retryable,
                });
                Err(err)
            }
        }
    }
}
