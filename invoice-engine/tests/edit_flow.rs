//! End-to-end edit sessions against in-memory collaborators

use async_trait::async_trait;
use invoice_engine::{
    AnnulmentState, CollaboratorError, Collaborators, EditError, InFlight, InvoiceSource,
    PinValidator, SessionHandle, SessionNotice, SubmissionSink,
};
use shared::error::{AppError, ErrorCode};
use shared::invoice::{
    Authorizer, Capabilities, ChangeEventType, InvoiceLineRecord, InvoiceRecord, LineChanges,
    PinOutcome, ProductRef, SaveReceipt, SaveSubmission, StockDirection, TaxMode,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

// ========== Fakes ==========

struct MemoryInvoices {
    records: HashMap<String, InvoiceRecord>,
}

#[async_trait]
impl InvoiceSource for MemoryInvoices {
    async fn fetch_invoice(&self, invoice_number: &str) -> Result<InvoiceRecord, CollaboratorError> {
        self.records
            .get(invoice_number)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(invoice_number.to_string()))
    }
}

#[derive(Default)]
struct FixedPin {
    calls: AtomicUsize,
}

#[async_trait]
impl PinValidator for FixedPin {
    async fn validate_pin(&self, pin: &str) -> Result<PinOutcome, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if pin == "4321" {
            Ok(PinOutcome::Authorized(Authorizer {
                id: Some(3),
                name: Some("Supervisor".to_string()),
            }))
        } else {
            Ok(PinOutcome::Rejected)
        }
    }
}

struct UnreachablePin;

#[async_trait]
impl PinValidator for UnreachablePin {
    async fn validate_pin(&self, _pin: &str) -> Result<PinOutcome, CollaboratorError> {
        Err(CollaboratorError::Network("connection refused".to_string()))
    }
}

struct StalledPin;

#[async_trait]
impl PinValidator for StalledPin {
    async fn validate_pin(&self, _pin: &str) -> Result<PinOutcome, CollaboratorError> {
        std::future::pending().await
    }
}

#[derive(Default)]
struct RecordingSink {
    fail_next: AtomicBool,
    submitted: Mutex<Vec<SaveSubmission>>,
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    async fn submit(
        &self,
        invoice_number: &str,
        submission: &SaveSubmission,
    ) -> Result<SaveReceipt, CollaboratorError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CollaboratorError::Api(AppError::with_message(
                ErrorCode::InvoiceSaveFailed,
                "stock store unavailable",
            )));
        }
        self.submitted.lock().unwrap().push(submission.clone());
        Ok(SaveReceipt {
            invoice_number: invoice_number.to_string(),
            applied_adjustments: submission.stock_adjustments.len(),
        })
    }
}

/// Holds every submit until a permit is released
struct GatedSink {
    gate: Semaphore,
}

#[async_trait]
impl SubmissionSink for GatedSink {
    async fn submit(
        &self,
        invoice_number: &str,
        _submission: &SaveSubmission,
    ) -> Result<SaveReceipt, CollaboratorError> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| CollaboratorError::Network(e.to_string()))?;
        Ok(SaveReceipt {
            invoice_number: invoice_number.to_string(),
            applied_adjustments: 0,
        })
    }
}

// ========== Fixtures ==========

fn line(product_id: i64, name: &str, quantity: i32, unit_price: f64) -> InvoiceLineRecord {
    InvoiceLineRecord {
        product_id,
        name: name.to_string(),
        quantity,
        unit_price,
        discount_percent: 0.0,
        code: None,
        description: None,
    }
}

fn product(product_id: i64, name: &str, unit_price: f64) -> ProductRef {
    ProductRef {
        product_id,
        name: name.to_string(),
        unit_price,
        code: None,
        description: None,
    }
}

fn invoices() -> Arc<MemoryInvoices> {
    let record = InvoiceRecord {
        invoice_number: "F-2001".to_string(),
        client_id: Some(12),
        general_discount_percent: 0.0,
        line_items: vec![line(1, "Tire A", 2, 100.0), line(2, "Tire B", 1, 50.0)],
    };
    Arc::new(MemoryInvoices {
        records: HashMap::from([(record.invoice_number.clone(), record)]),
    })
}

fn collaborators(
    pins: Arc<dyn PinValidator>,
    submissions: Arc<dyn SubmissionSink>,
    capabilities: Capabilities,
) -> Collaborators {
    Collaborators {
        invoices: invoices(),
        pins,
        submissions,
        policy: Arc::new(capabilities),
    }
}

async fn open(pins: Arc<dyn PinValidator>, submissions: Arc<dyn SubmissionSink>) -> SessionHandle {
    SessionHandle::open(
        "F-2001",
        collaborators(pins, submissions, Capabilities::all()),
        TaxMode::Inclusive,
    )
    .await
    .unwrap()
}

// ========== Tests ==========

#[tokio::test]
async fn test_open_unknown_invoice() {
    let result = SessionHandle::open(
        "F-404",
        collaborators(
            Arc::new(FixedPin::default()),
            Arc::new(RecordingSink::default()),
            Capabilities::all(),
        ),
        TaxMode::Inclusive,
    )
    .await;
    assert!(matches!(
        result,
        Err(EditError::Collaborator(CollaboratorError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_edit_and_save_produces_minimal_adjustments() {
    let sink = Arc::new(RecordingSink::default());
    let handle = open(Arc::new(FixedPin::default()), sink.clone()).await;

    handle.update_item(1, LineChanges::quantity(1)).unwrap();
    handle.remove_item(2).unwrap();
    handle.add_item(product(3, "Tire C", 80.0), 3).unwrap();

    let outcome = handle.save().await.unwrap();
    assert_eq!(outcome.receipt.invoice_number, "F-2001");
    assert_eq!(outcome.receipt.applied_adjustments, 3);

    let adjustments: Vec<_> = outcome
        .submission
        .stock_adjustments
        .iter()
        .map(|a| (a.product_id, a.direction, a.quantity))
        .collect();
    assert_eq!(
        adjustments,
        vec![
            (2, StockDirection::Entrada, 1),
            (3, StockDirection::Salida, 3),
            (1, StockDirection::Entrada, 1),
        ]
    );
    assert_eq!(outcome.submission.computed_totals.total, 340.0);
    assert!(!outcome.submission.es_anulada);
    assert_eq!(outcome.submission.audit_trail.len(), 3);
    assert_eq!(sink.submitted.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_annulment_on_then_off_leaves_trail_unchanged() {
    let pins = Arc::new(FixedPin::default());
    let handle = open(pins.clone(), Arc::new(RecordingSink::default())).await;
    handle.update_item(2, LineChanges::unit_price(45.0)).unwrap();
    let before = handle.audit_trail();

    let event = handle.request_annulment("4321").await.unwrap();
    assert_eq!(event.event_type, ChangeEventType::InvoiceVoided);
    assert_eq!(handle.annulment_state(), AnnulmentState::Confirmed);
    assert_eq!(handle.audit_trail().len(), before.len() + 1);

    handle.revert_annulment().unwrap();
    assert_eq!(handle.annulment_state(), AnnulmentState::Off);
    assert_eq!(handle.audit_trail(), before);
    assert_eq!(pins.calls.load(Ordering::SeqCst), 1);

    let outcome = handle.save().await.unwrap();
    assert!(!outcome.submission.es_anulada);
    assert!(outcome.submission.stock_adjustments.is_empty());
}

#[tokio::test]
async fn test_void_returns_every_original_line() {
    let handle = open(
        Arc::new(FixedPin::default()),
        Arc::new(RecordingSink::default()),
    )
    .await;
    handle.remove_item(1).unwrap();
    handle.request_annulment("4321").await.unwrap();

    let outcome = handle.save().await.unwrap();
    let submission = outcome.submission;
    assert!(submission.es_anulada);
    assert_eq!(submission.stock_adjustments.len(), 2);
    assert!(submission
        .stock_adjustments
        .iter()
        .all(|a| a.direction == StockDirection::Entrada && a.reason == "void of invoice F-2001"));
    let returned: i32 = submission.stock_adjustments.iter().map(|a| a.quantity).sum();
    assert_eq!(returned, 3);
}

#[tokio::test]
async fn test_rejected_pin_reverts_to_off() {
    let handle = open(
        Arc::new(FixedPin::default()),
        Arc::new(RecordingSink::default()),
    )
    .await;

    let err = handle.request_annulment("0000").await.unwrap_err();
    assert!(matches!(err, EditError::PinRejected));
    assert!(AppError::from(err).is_retryable());
    assert_eq!(handle.annulment_state(), AnnulmentState::Off);
    assert!(handle.audit_trail().is_empty());
    assert!(!handle.is_busy());

    // a retry with the right PIN goes through
    handle.request_annulment("4321").await.unwrap();
    assert_eq!(handle.annulment_state(), AnnulmentState::Confirmed);
}

#[tokio::test]
async fn test_pin_transport_failure_reverts_to_off() {
    let handle = open(Arc::new(UnreachablePin), Arc::new(RecordingSink::default())).await;

    let err = handle.request_annulment("4321").await.unwrap_err();
    assert!(matches!(
        err,
        EditError::Collaborator(CollaboratorError::Network(_))
    ));
    assert_eq!(handle.annulment_state(), AnnulmentState::Off);
    assert!(handle.audit_trail().is_empty());
}

#[tokio::test]
async fn test_cancelled_pin_prompt_leaves_no_trace() {
    let handle = open(Arc::new(StalledPin), Arc::new(RecordingSink::default())).await;
    let mut notices = handle.subscribe();

    let result =
        tokio::time::timeout(Duration::from_millis(20), handle.request_annulment("4321")).await;
    assert!(result.is_err());

    assert_eq!(handle.annulment_state(), AnnulmentState::Off);
    assert!(!handle.is_busy());
    assert!(handle.audit_trail().is_empty());
    assert!(handle.add_item(product(3, "Tire C", 80.0), 1).is_ok());

    assert!(matches!(
        notices.try_recv().unwrap(),
        SessionNotice::Annulment(AnnulmentState::PendingPin)
    ));
    assert!(matches!(
        notices.try_recv().unwrap(),
        SessionNotice::Annulment(AnnulmentState::Off)
    ));
}

#[tokio::test]
async fn test_second_pin_request_while_pending_is_busy() {
    let handle = open(Arc::new(StalledPin), Arc::new(RecordingSink::default())).await;

    let mut pending = Box::pin(handle.request_annulment("4321"));
    let polled = tokio::time::timeout(Duration::from_millis(20), pending.as_mut()).await;
    assert!(polled.is_err());
    assert_eq!(handle.in_flight(), Some(InFlight::PinValidation));
    assert_eq!(handle.annulment_state(), AnnulmentState::PendingPin);

    assert!(matches!(
        handle.request_annulment("4321").await,
        Err(EditError::SessionBusy("pin validation"))
    ));
    assert!(matches!(
        handle.update_item(1, LineChanges::quantity(3)),
        Err(EditError::SessionBusy("pin validation"))
    ));
    assert_eq!(handle.annulment_state(), AnnulmentState::PendingPin);

    drop(pending);
    assert_eq!(handle.annulment_state(), AnnulmentState::Off);
    assert!(!handle.is_busy());
    assert!(handle.audit_trail().is_empty());
}

#[tokio::test]
async fn test_failed_save_keeps_state_and_retry_succeeds() {
    let sink = Arc::new(RecordingSink::default());
    sink.fail_next.store(true, Ordering::SeqCst);
    let handle = open(Arc::new(FixedPin::default()), sink.clone()).await;
    let mut notices = handle.subscribe();

    handle.update_item(1, LineChanges::quantity(5)).unwrap();
    let items = handle.items();
    let trail = handle.audit_trail();

    let err = handle.save().await.unwrap_err();
    assert!(matches!(err, EditError::Collaborator(CollaboratorError::Api(_))));
    assert!(!handle.is_closed());
    assert!(!handle.is_busy());
    assert_eq!(handle.items(), items);
    assert_eq!(handle.audit_trail(), trail);

    let outcome = handle.save().await.unwrap();
    assert_eq!(outcome.submission.stock_adjustments.len(), 1);
    assert_eq!(outcome.submission.stock_adjustments[0].quantity, 3);
    assert!(handle.is_closed());

    let mut kinds = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        kinds.push(match notice {
            SessionNotice::Changed(_) => "changed",
            SessionNotice::SaveFailed { retryable, .. } => {
                assert!(retryable);
                "failed"
            }
            SessionNotice::Saved(_) => "saved",
            _ => "other",
        });
    }
    assert_eq!(kinds, vec!["changed", "failed", "saved"]);
}

#[tokio::test]
async fn test_session_busy_while_save_in_flight() {
    let sink = Arc::new(GatedSink {
        gate: Semaphore::new(0),
    });
    let handle = open(Arc::new(FixedPin::default()), sink.clone()).await;
    handle.update_item(2, LineChanges::quantity(4)).unwrap();

    let saver = handle.clone();
    let task = tokio::spawn(async move { saver.save().await });
    while !handle.is_busy() {
        tokio::task::yield_now().await;
    }
    assert_eq!(handle.in_flight(), Some(InFlight::Save));

    assert!(matches!(
        handle.add_item(product(3, "Tire C", 80.0), 1),
        Err(EditError::SessionBusy("save"))
    ));
    assert!(matches!(
        handle.request_annulment("4321").await,
        Err(EditError::SessionBusy("save"))
    ));
    assert!(matches!(
        handle.save().await,
        Err(EditError::SessionBusy("save"))
    ));

    sink.gate.add_permits(1);
    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.submission.line_items.len(), 2);
    assert!(handle.is_closed());
    assert!(matches!(
        handle.update_item(2, LineChanges::quantity(1)),
        Err(EditError::SessionClosed)
    ));
}

#[tokio::test]
async fn test_read_only_policy_denies_edits_and_void() {
    let handle = SessionHandle::open(
        "F-2001",
        collaborators(
            Arc::new(FixedPin::default()),
            Arc::new(RecordingSink::default()),
            Capabilities::read_only(),
        ),
        TaxMode::Inclusive,
    )
    .await
    .unwrap();

    let err = handle.remove_item(1).unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::PermissionDenied);
    assert!(matches!(
        handle.request_annulment("4321").await,
        Err(EditError::PermissionDenied("void_invoice"))
    ));
    assert_eq!(handle.annulment_state(), AnnulmentState::Off);
    assert!(!handle.is_busy());
}

#[tokio::test]
async fn test_legacy_tax_mode_session() {
    let handle = SessionHandle::open(
        "F-2001",
        collaborators(
            Arc::new(FixedPin::default()),
            Arc::new(RecordingSink::default()),
            Capabilities::all(),
        ),
        TaxMode::Legacy,
    )
    .await
    .unwrap();

    handle.set_general_discount(10.0).unwrap();
    let totals = handle.totals();
    assert_eq!(totals.subtotal, 250.0);
    assert_eq!(totals.general_discount_amount, 25.0);
    assert_eq!(totals.net, 225.0);
    assert_eq!(totals.tax_amount, 29.25);
    assert_eq!(totals.total, 254.25);
}
