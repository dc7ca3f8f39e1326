//! Invoice edit session
//!
//! [`EditSession`] owns everything one edit of an issued invoice touches:
//! the frozen snapshot, the working set, the audit trail, the annulment
//! state and the cached totals. Every operation is synchronous and either
//! applies completely or returns an error with nothing changed.
//!
//! [`SessionHandle`] wraps a session for use from async UI code and adds the
//! two suspending operations (PIN validation and save).
//!
//! # Mutation Flow
//!
//! ```text
//! add_item / update_item / remove_item / set_general_discount / set_client
//!     ├─ 1. Session open and not marked for annulment
//!     ├─ 2. Capability check (resolved once at open)
//!     ├─ 3. Clamp input, mutate working set
//!     ├─ 4. Recompute line and invoice totals
//!     └─ 5. Record one ChangeEvent per changed field
//! ```

mod handle;

pub use handle::{InFlight, SaveOutcome, SessionHandle, SessionNotice};

use crate::annulment::{Annulment, AnnulmentState};
use crate::audit::AuditTrail;
use crate::error::{EditError, EditResult};
use crate::money;
use crate::reconcile::reconcile;
use crate::snapshot::{InvoiceSnapshot, WorkingSet, line_from_product};
use serde_json::json;
use shared::invoice::{
    Authorizer, Capabilities, ChangeEvent, ChangeEventType, FieldChange, InvoiceRecord,
    InvoiceTotals, LineChanges, LineItem, ProductRef, SaveSubmission, StockAdjustment, TaxMode,
};

#[derive(Debug, Clone)]
pub struct EditSession {
    snapshot: InvoiceSnapshot,
    working: WorkingSet,
    client_id: Option<i64>,
    general_discount_percent: f64,
    audit: AuditTrail,
    annulment: Annulment,
    capabilities: Capabilities,
    tax_mode: TaxMode,
    totals: InvoiceTotals,
    closed: bool,
}

impl EditSession {
    /// Open a session over a retrieved invoice
    pub fn open(
        record: InvoiceRecord,
        capabilities: Capabilities,
        tax_mode: TaxMode,
    ) -> EditResult<Self> {
        let snapshot = InvoiceSnapshot::from_record(record)?;
        let working = WorkingSet::from_snapshot(&snapshot);
        let general_discount_percent = money::clamp_percent(snapshot.general_discount_percent());
        let totals = money::calculate_totals(working.items(), general_discount_percent, tax_mode);

        tracing::info!(
            invoice_number = %snapshot.invoice_number(),
            items = snapshot.items().len(),
            tax_mode = ?tax_mode,
            "Edit session opened"
        );

        Ok(Self {
            client_id: snapshot.client_id(),
            snapshot,
            working,
            general_discount_percent,
            audit: AuditTrail::new(),
            annulment: Annulment::default(),
            capabilities,
            tax_mode,
            totals,
            closed: false,
        })
    }

    // ========== Accessors ==========

    pub fn invoice_number(&self) -> &str {
        self.snapshot.invoice_number()
    }

    pub fn snapshot(&self) -> &InvoiceSnapshot {
        &self.snapshot
    }

    pub fn items(&self) -> &[LineItem] {
        self.working.items()
    }

    pub fn client_id(&self) -> Option<i64> {
        self.client_id
    }

    pub fn general_discount_percent(&self) -> f64 {
        self.general_discount_percent
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn annulment_state(&self) -> AnnulmentState {
        self.annulment.state()
    }

    pub fn is_anulada(&self) -> bool {
        self.annulment.is_confirmed()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn tax_mode(&self) -> TaxMode {
        self.tax_mode
    }

    pub fn totals(&self) -> &InvoiceTotals {
        &self.totals
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // ========== Guards ==========

    fn ensure_open(&self) -> EditResult<()> {
        if self.closed {
            return Err(EditError::SessionClosed);
        }
        Ok(())
    }

    fn ensure_editable(&self) -> EditResult<()> {
        self.ensure_open()?;
        match self.annulment.state() {
            AnnulmentState::Off => Ok(()),
            AnnulmentState::PendingPin => Err(EditError::SessionBusy(InFlight::PinValidation.label())),
            AnnulmentState::Confirmed => Err(EditError::AnnulmentConfirmed),
        }
    }

    fn require(granted: bool, capability: &'static str) -> EditResult<()> {
        if granted {
            Ok(())
        } else {
            tracing::warn!(capability, "Edit rejected: missing capability");
            Err(EditError::PermissionDenied(capability))
        }
    }

    fn refresh_totals(&mut self) {
        self.totals = money::calculate_totals(
            self.working.items(),
            self.general_discount_percent,
            self.tax_mode,
        );
    }

    fn record(&mut self, event: ChangeEvent) -> ChangeEvent {
        self.audit.record(event).clone()
    }

    // ========== Line-Item Editor ==========

    /// Add a product as a new line (discount 0)
    pub fn add_item(&mut self, product: ProductRef, quantity: i32) -> EditResult<ChangeEvent> {
        self.ensure_editable()?;
        Self::require(self.capabilities.edit_items, "edit_items")?;

        let item = self.working.insert(line_from_product(product, quantity))?.clone();
        self.refresh_totals();

        tracing::debug!(product_id = item.product_id, quantity = item.quantity, "Line added");
        Ok(self.record(ChangeEvent::new(
            ChangeEventType::ItemAdded,
            format!(
                "Added {} x{} at {:.2}",
                item.name, item.quantity, item.unit_price
            ),
            Some(json!({
                "productId": item.product_id,
                "name": item.name,
                "quantity": item.quantity,
                "unitPrice": item.unit_price,
                "subtotal": item.subtotal,
            })),
        )))
    }

    /// Change quantity, price and/or discount of an existing line
    ///
    /// Out-of-range input is clamped. Returns one event per field whose value
    /// actually changed, in the order quantity, price, discount.
    pub fn update_item(
        &mut self,
        product_id: i64,
        changes: LineChanges,
    ) -> EditResult<Vec<ChangeEvent>> {
        self.ensure_editable()?;
        if changes.quantity.is_some() {
            Self::require(self.capabilities.edit_items, "edit_items")?;
        }
        if changes.unit_price.is_some() {
            Self::require(self.capabilities.edit_prices, "edit_prices")?;
        }
        if changes.discount_percent.is_some() {
            Self::require(self.capabilities.apply_discounts, "apply_discounts")?;
        }

        let item = self
            .working
            .get_mut(product_id)
            .ok_or(EditError::ItemNotFound(product_id))?;
        let before = item.clone();

        // Recompute on a copy; the working line changes only once it is consistent
        let mut after = before.clone();
        if let Some(quantity) = changes.quantity {
            after.quantity = money::clamp_quantity(quantity);
        }
        if let Some(unit_price) = changes.unit_price {
            after.unit_price = money::clamp_price(unit_price);
        }
        if let Some(discount_percent) = changes.discount_percent {
            after.discount_percent = money::clamp_percent(discount_percent);
        }
        money::recalculate_line(&mut after);
        *item = after.clone();

        let mut events = Vec::new();
        if before.quantity != after.quantity {
            events.push(line_field_event(
                ChangeEventType::QuantityChanged,
                format!("Quantity of {}: {} -> {}", after.name, before.quantity, after.quantity),
                FieldChange::new("quantity", before.quantity, after.quantity),
                &before,
                &after,
            ));
        }
        if before.unit_price != after.unit_price {
            events.push(line_field_event(
                ChangeEventType::PriceChanged,
                format!(
                    "Unit price of {}: {:.2} -> {:.2}",
                    after.name, before.unit_price, after.unit_price
                ),
                FieldChange::new("unitPrice", before.unit_price, after.unit_price),
                &before,
                &after,
            ));
        }
        if before.discount_percent != after.discount_percent {
            events.push(line_field_event(
                ChangeEventType::DiscountChanged,
                format!(
                    "Discount on {}: {}% -> {}%",
                    after.name, before.discount_percent, after.discount_percent
                ),
                FieldChange::new("discountPercent", before.discount_percent, after.discount_percent),
                &before,
                &after,
            ));
        }

        if events.is_empty() {
            return Ok(events);
        }

        self.refresh_totals();
        tracing::debug!(product_id, changes = events.len(), "Line updated");
        Ok(events.into_iter().map(|e| self.record(e)).collect())
    }

    /// Delete a line
    pub fn remove_item(&mut self, product_id: i64) -> EditResult<ChangeEvent> {
        self.ensure_editable()?;
        Self::require(self.capabilities.edit_items, "edit_items")?;

        let item = self.working.remove(product_id)?;
        self.refresh_totals();

        tracing::debug!(product_id, "Line removed");
        Ok(self.record(ChangeEvent::new(
            ChangeEventType::ItemRemoved,
            format!("Removed {} (x{})", item.name, item.quantity),
            Some(json!({
                "productId": item.product_id,
                "name": item.name,
                "quantity": item.quantity,
                "subtotal": item.subtotal,
            })),
        )))
    }

    /// Set the invoice-level discount percentage (clamped to [0, 100])
    pub fn set_general_discount(&mut self, percent: f64) -> EditResult<Option<ChangeEvent>> {
        self.ensure_editable()?;
        Self::require(self.capabilities.apply_discounts, "apply_discounts")?;

        let percent = money::clamp_percent(percent);
        let previous = self.general_discount_percent;
        if previous == percent {
            return Ok(None);
        }
        self.general_discount_percent = percent;
        self.refresh_totals();

        Ok(Some(self.record(ChangeEvent::new(
            ChangeEventType::GeneralDiscountChanged,
            format!("General discount: {}% -> {}%", previous, percent),
            Some(json!({
                "changes": [FieldChange::new("generalDiscountPercent", previous, percent)],
                "total": self.totals.total,
            })),
        ))))
    }

    /// Bill the invoice to another client
    pub fn set_client(&mut self, client_id: Option<i64>) -> EditResult<Option<ChangeEvent>> {
        self.ensure_editable()?;
        Self::require(self.capabilities.edit_items, "edit_items")?;

        let previous = self.client_id;
        if previous == client_id {
            return Ok(None);
        }
        self.client_id = client_id;

        let describe = |id: Option<i64>| id.map_or_else(|| "none".to_string(), |id| id.to_string());
        Ok(Some(self.record(ChangeEvent::new(
            ChangeEventType::ClientChanged,
            format!("Client: {} -> {}", describe(previous), describe(client_id)),
            Some(json!({
                "changes": [FieldChange::new("clientId", previous, client_id)],
            })),
        ))))
    }

    // ========== Annulment ==========

    /// Off -> PendingPin
    pub fn begin_annulment(&mut self) -> EditResult<()> {
        self.ensure_open()?;
        Self::require(self.capabilities.void_invoice, "void_invoice")?;
        self.annulment.begin()
    }

    /// PendingPin -> Confirmed after the PIN was accepted
    pub fn confirm_annulment(&mut self, authorizer: &Authorizer) -> EditResult<ChangeEvent> {
        self.ensure_open()?;
        let event =
            self.annulment
                .confirm(&mut self.audit, self.snapshot.invoice_number(), authorizer)?;
        tracing::info!(
            invoice_number = %self.snapshot.invoice_number(),
            authorizer_id = ?authorizer.id,
            "Invoice marked for annulment"
        );
        Ok(event)
    }

    /// PendingPin -> Off without any audit trace
    pub fn abort_annulment(&mut self) -> bool {
        self.annulment.abort()
    }

    /// Confirmed -> Off, retracting the annulment event
    pub fn revert_annulment(&mut self) -> EditResult<Option<ChangeEvent>> {
        self.ensure_open()?;
        let retracted = self.annulment.revert(&mut self.audit)?;
        tracing::info!(invoice_number = %self.snapshot.invoice_number(), "Annulment reverted");
        Ok(retracted)
    }

    // ========== Save ==========

    /// Stock adjustments the current state would produce on save
    pub fn stock_adjustments(&self) -> Vec<StockAdjustment> {
        reconcile(
            &self.snapshot,
            self.working.items(),
            self.annulment.is_confirmed(),
        )
    }

    /// Build the save payload without changing anything
    pub fn prepare_submission(&self) -> EditResult<SaveSubmission> {
        self.ensure_open()?;
        if self.annulment.state() == AnnulmentState::PendingPin {
            return Err(EditError::SessionBusy(InFlight::PinValidation.label()));
        }
        Ok(SaveSubmission {
            client_id: self.client_id,
            line_items: self.working.items().to_vec(),
            general_discount_percent: self.general_discount_percent,
            computed_totals: self.totals.clone(),
            audit_trail: self.audit.events().to_vec(),
            es_anulada: self.annulment.is_confirmed(),
            stock_adjustments: self.stock_adjustments(),
        })
    }

    /// Close the session after the persistence collaborator accepted the save
    pub(crate) fn mark_saved(&mut self) {
        self.closed = true;
    }
}

fn line_field_event(
    event_type: ChangeEventType,
    description: String,
    change: FieldChange,
    before: &LineItem,
    after: &LineItem,
) -> ChangeEvent {
    ChangeEvent::new(
        event_type,
        description,
        Some(json!({
            "productId": after.product_id,
            "name": after.name,
            "changes": [change],
            "subtotal": { "from": before.subtotal, "to": after.subtotal },
        })),
    )
}
