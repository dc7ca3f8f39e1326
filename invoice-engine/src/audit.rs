//! Session audit trail
//!
//! Ordered, append-only record of edit actions. The only removal allowed is
//! retracting the `factura_anulada` event when an annulment is reverted.

use shared::invoice::{ChangeEvent, ChangeEventType};

#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    events: Vec<ChangeEvent>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return a reference to the stored copy
    pub fn record(&mut self, event: ChangeEvent) -> &ChangeEvent {
        tracing::info!(
            target: "audit",
            event_id = %event.id,
            event_type = %event.event_type,
            description = %event.description,
            "Audit event recorded"
        );
        self.events.push(event);
        &self.events[self.events.len() - 1]
    }

    /// Remove the annulment event with the given id
    ///
    /// Returns `None` (and removes nothing) for any other event type.
    pub(crate) fn retract_annulment(&mut self, event_id: &str) -> Option<ChangeEvent> {
        let index = self
            .events
            .iter()
            .position(|e| e.id == event_id && e.event_type == ChangeEventType::InvoiceVoided)?;
        let event = self.events.remove(index);
        tracing::info!(target: "audit", event_id = %event.id, "Annulment event retracted");
        Some(event)
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<&ChangeEvent> {
        self.events.last()
    }

    /// Events of one type, in recording order
    pub fn of_type(&self, event_type: ChangeEventType) -> impl Iterator<Item = &ChangeEvent> {
        self.events.iter().filter(move |e| e.event_type == event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: ChangeEventType) -> ChangeEvent {
        ChangeEvent::new(event_type, "test", None)
    }

    #[test]
    fn test_record_preserves_order() {
        let mut trail = AuditTrail::new();
        trail.record(event(ChangeEventType::ItemAdded));
        trail.record(event(ChangeEventType::QuantityChanged));
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.events()[0].event_type, ChangeEventType::ItemAdded);
        assert_eq!(trail.last().unwrap().event_type, ChangeEventType::QuantityChanged);
    }

    #[test]
    fn test_retract_only_annulment_events() {
        let mut trail = AuditTrail::new();
        let added_id = trail.record(event(ChangeEventType::ItemAdded)).id.clone();
        let void_id = trail.record(event(ChangeEventType::InvoiceVoided)).id.clone();

        assert!(trail.retract_annulment(&added_id).is_none());
        assert_eq!(trail.len(), 2);

        let retracted = trail.retract_annulment(&void_id).unwrap();
        assert_eq!(retracted.event_type, ChangeEventType::InvoiceVoided);
        assert_eq!(trail.len(), 1);
        assert!(trail.retract_annulment(&void_id).is_none());
    }

    #[test]
    fn test_of_type() {
        let mut trail = AuditTrail::new();
        trail.record(event(ChangeEventType::PriceChanged));
        trail.record(event(ChangeEventType::ItemRemoved));
        trail.record(event(ChangeEventType::PriceChanged));
        assert_eq!(trail.of_type(ChangeEventType::PriceChanged).count(), 2);
        assert!(!trail.is_empty());
    }
}
