//! Invoice Snapshot Store
//!
//! [`InvoiceSnapshot`] is the invoice as issued, fixed when the session opens.
//! [`WorkingSet`] is the mutable copy being edited. Both keep insertion order
//! and are keyed by `product_id`.

use crate::error::{EditError, EditResult};
use crate::money;
use shared::invoice::{InvoiceLineRecord, InvoiceRecord, LineItem, ProductRef};
use std::collections::HashSet;
use validator::Validate;

/// Build a line with derived fields computed
pub fn line_from_product(product: ProductRef, quantity: i32) -> LineItem {
    let mut item = LineItem {
        product_id: product.product_id,
        name: product.name,
        quantity: money::clamp_quantity(quantity),
        unit_price: money::clamp_price(product.unit_price),
        discount_percent: 0.0,
        discount_amount: 0.0,
        subtotal: 0.0,
        code: product.code,
        description: product.description,
    };
    money::recalculate_line(&mut item);
    item
}

fn line_from_record(record: InvoiceLineRecord) -> LineItem {
    let mut item = LineItem {
        product_id: record.product_id,
        name: record.name,
        quantity: money::clamp_quantity(record.quantity),
        unit_price: money::clamp_price(record.unit_price),
        discount_percent: money::clamp_percent(record.discount_percent),
        discount_amount: 0.0,
        subtotal: 0.0,
        code: record.code,
        description: record.description,
    };
    money::recalculate_line(&mut item);
    item
}

/// The original invoice; never mutated after construction
#[derive(Debug, Clone)]
pub struct InvoiceSnapshot {
    invoice_number: String,
    client_id: Option<i64>,
    general_discount_percent: f64,
    items: Vec<LineItem>,
}

impl InvoiceSnapshot {
    /// Validate a retrieved invoice and freeze it
    pub fn from_record(record: InvoiceRecord) -> EditResult<Self> {
        record
            .validate()
            .map_err(|e| EditError::InvalidRecord(e.to_string()))?;

        let mut seen = HashSet::with_capacity(record.line_items.len());
        for line in &record.line_items {
            if !seen.insert(line.product_id) {
                return Err(EditError::InvalidRecord(format!(
                    "duplicate product {} on invoice {}",
                    line.product_id, record.invoice_number
                )));
            }
        }

        Ok(Self {
            invoice_number: record.invoice_number,
            client_id: record.client_id,
            general_discount_percent: record.general_discount_percent,
            items: record.line_items.into_iter().map(line_from_record).collect(),
        })
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn client_id(&self) -> Option<i64> {
        self.client_id
    }

    pub fn general_discount_percent(&self) -> f64 {
        self.general_discount_percent
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, product_id: i64) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    /// Total quantity across all lines
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }
}

/// Working copy of the line items
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    items: Vec<LineItem>,
}

impl WorkingSet {
    pub fn from_snapshot(snapshot: &InvoiceSnapshot) -> Self {
        Self {
            items: snapshot.items().to_vec(),
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, product_id: i64) -> Option<&LineItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn get_mut(&mut self, product_id: i64) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }

    pub fn contains(&self, product_id: i64) -> bool {
        self.get(product_id).is_some()
    }

    /// Append a new line; product ids stay unique
    pub fn insert(&mut self, item: LineItem) -> EditResult<&LineItem> {
        if self.contains(item.product_id) {
            return Err(EditError::DuplicateProduct(item.product_id));
        }
        self.items.push(item);
        Ok(&self.items[self.items.len() - 1])
    }

    pub fn remove(&mut self, product_id: i64) -> EditResult<LineItem> {
        let index = self
            .items
            .iter()
            .position(|i| i.product_id == product_id)
            .ok_or(EditError::ItemNotFound(product_id))?;
        Ok(self.items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
