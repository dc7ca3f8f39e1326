//! Save submission payload

use super::adjustment::StockAdjustment;
use super::event::ChangeEvent;
use super::types::{InvoiceTotals, LineItem};
use serde::{Deserialize, Serialize};

/// Everything the persistence collaborator needs to apply an edit or a void atomically
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveSubmission {
    pub client_id: Option<i64>,
    pub line_items: Vec<LineItem>,
    pub general_discount_percent: f64,
    pub computed_totals: InvoiceTotals,
    pub audit_trail: Vec<ChangeEvent>,
    /// true = void semantics (full return of the original lines)
    pub es_anulada: bool,
    pub stock_adjustments: Vec<StockAdjustment>,
}

/// Acknowledgement returned by the persistence collaborator
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub invoice_number: String,
    #[serde(default)]
    pub applied_adjustments: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{StockDirection, TaxMode};

    #[test]
    fn test_submission_wire_keys() {
        let submission = SaveSubmission {
            client_id: Some(9),
            line_items: vec![],
            general_discount_percent: 0.0,
            computed_totals: InvoiceTotals {
                subtotal: 0.0,
                general_discount_percent: 0.0,
                general_discount_amount: 0.0,
                net: 0.0,
                tax_amount: 0.0,
                total: 0.0,
                tax_mode: TaxMode::Inclusive,
            },
            audit_trail: vec![],
            es_anulada: true,
            stock_adjustments: vec![StockAdjustment {
                product_id: 1,
                name: "Aceite".to_string(),
                direction: StockDirection::Entrada,
                quantity: 2,
                reason: "void of invoice F-1".to_string(),
            }],
        };
        let value = serde_json::to_value(&submission).unwrap();
        for key in [
            "clientId",
            "lineItems",
            "generalDiscountPercent",
            "computedTotals",
            "auditTrail",
            "esAnulada",
            "stockAdjustments",
        ] {
            assert!(value.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(value["stockAdjustments"][0]["direction"], "entrada");
        assert_eq!(value["computedTotals"]["taxMode"], "inclusive");
    }
}
