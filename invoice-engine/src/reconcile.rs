//! Reconciliation Engine
//!
//! Turns the difference between the issued invoice and the edited working set
//! into stock adjustment instructions. Depends only on its three inputs; the
//! edit history that produced the working set is irrelevant.
//!
//! # Order of output
//!
//! ```text
//! void:  entrada per original line (original order)
//! edit:  removed (original order)
//!        → added (working order)
//!        → quantity changed (original order)
//! ```

use crate::snapshot::InvoiceSnapshot;
use shared::invoice::{LineItem, StockAdjustment, StockDirection};
use std::collections::HashMap;

pub const REASON_LINE_REMOVED: &str = "line removed during edit";
pub const REASON_LINE_ADDED: &str = "line added during edit";
pub const REASON_QUANTITY_INCREASED: &str = "quantity increased";
pub const REASON_QUANTITY_DECREASED: &str = "quantity decreased";

/// Reason text for the full return of a voided invoice
pub fn void_reason(invoice_number: &str) -> String {
    format!("void of invoice {}", invoice_number)
}

fn adjustment(
    item: &LineItem,
    direction: StockDirection,
    quantity: i32,
    reason: impl Into<String>,
) -> StockAdjustment {
    StockAdjustment {
        product_id: item.product_id,
        name: item.name.clone(),
        direction,
        quantity,
        reason: reason.into(),
    }
}

/// Compute the stock adjustments implied by saving `working` over `original`
pub fn reconcile(
    original: &InvoiceSnapshot,
    working: &[LineItem],
    annulment_confirmed: bool,
) -> Vec<StockAdjustment> {
    if annulment_confirmed {
        let reason = void_reason(original.invoice_number());
        return original
            .items()
            .iter()
            .map(|item| adjustment(item, StockDirection::Entrada, item.quantity, reason.as_str()))
            .collect();
    }

    let working_by_id: HashMap<i64, &LineItem> =
        working.iter().map(|item| (item.product_id, item)).collect();
    let original_by_id: HashMap<i64, &LineItem> = original
        .items()
        .iter()
        .map(|item| (item.product_id, item))
        .collect();

    let mut adjustments = Vec::new();

    // 1. Removed lines go back to stock
    for item in original.items() {
        if !working_by_id.contains_key(&item.product_id) {
            adjustments.push(adjustment(
                item,
                StockDirection::Entrada,
                item.quantity,
                REASON_LINE_REMOVED,
            ));
        }
    }

    // 2. Added lines leave stock
    for item in working {
        if !original_by_id.contains_key(&item.product_id) {
            adjustments.push(adjustment(
                item,
                StockDirection::Salida,
                item.quantity,
                REASON_LINE_ADDED,
            ));
        }
    }

    // 3. Quantity deltas; price and discount edits never move stock
    for before in original.items() {
        let Some(after) = working_by_id.get(&before.product_id) else {
            continue;
        };
        let delta = after.quantity - before.quantity;
        if delta > 0 {
            adjustments.push(adjustment(
                after,
                StockDirection::Salida,
                delta,
                REASON_QUANTITY_INCREASED,
            ));
        } else if delta < 0 {
            adjustments.push(adjustment(
                after,
                StockDirection::Entrada,
                -delta,
                REASON_QUANTITY_DECREASED,
            ));
        }
    }

    adjustments
}
