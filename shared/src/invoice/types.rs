//! Invoice line items and session-level value types

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Product picked from the catalog to be added as a new line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub product_id: i64,
    pub name: String,
    pub unit_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Free-form descriptive text (e.g. a tire spec), carried untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Invoice line item (working copy and snapshot share this shape)
///
/// `discount_amount` and `subtotal` are derived; only the editor writes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Key, unique within an invoice
    pub product_id: i64,
    pub name: String,
    /// Always >= 1
    pub quantity: i32,
    pub unit_price: f64,
    /// Always within [0, 100]
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub subtotal: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Field changes requested for a single line (None = leave as is)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<f64>,
}

impl LineChanges {
    pub fn quantity(quantity: i32) -> Self {
        Self {
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    pub fn unit_price(unit_price: f64) -> Self {
        Self {
            unit_price: Some(unit_price),
            ..Default::default()
        }
    }

    pub fn discount_percent(discount_percent: f64) -> Self {
        Self {
            discount_percent: Some(discount_percent),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity.is_none() && self.unit_price.is_none() && self.discount_percent.is_none()
    }
}

/// Line as returned by invoice retrieval
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineRecord {
    pub product_id: i64,
    #[validate(length(min = 1, message = "line name must not be empty"))]
    pub name: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    #[validate(range(min = 0.0, message = "unit price must be non-negative"))]
    pub unit_price: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "discount must be within 0..=100"))]
    pub discount_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Issued invoice as returned by the retrieval collaborator
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[validate(length(min = 1, message = "invoice number must not be empty"))]
    pub invoice_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "discount must be within 0..=100"))]
    pub general_discount_percent: f64,
    #[validate(nested)]
    pub line_items: Vec<InvoiceLineRecord>,
}

/// How the invoice total treats tax
///
/// Both modes exist side by side; the caller picks one, the calculator never guesses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// Prices already include tax: total = net
    #[default]
    Inclusive,
    /// Older invoices: total = net + 13% tax on net
    Legacy,
}

impl std::str::FromStr for TaxMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Ok(Self::Inclusive),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown tax mode: {}", other)),
        }
    }
}

/// Computed invoice totals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub general_discount_percent: f64,
    pub general_discount_amount: f64,
    pub net: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub tax_mode: TaxMode,
}

/// Capability set resolved once per session from the permission policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Add, remove and change quantity of lines
    pub edit_items: bool,
    /// Change unit prices
    pub edit_prices: bool,
    /// Change line and general discounts
    pub apply_discounts: bool,
    /// Start the PIN-gated annulment
    pub void_invoice: bool,
}

impl Capabilities {
    pub const fn all() -> Self {
        Self {
            edit_items: true,
            edit_prices: true,
            apply_discounts: true,
            void_invoice: true,
        }
    }

    pub const fn read_only() -> Self {
        Self {
            edit_items: false,
            edit_prices: false,
            apply_discounts: false,
            void_invoice: false,
        }
    }
}

/// Supervisor that approved a PIN check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Authorizer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of a PIN validation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    Authorized(Authorizer),
    Rejected,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_line(quantity: i32, discount_percent: f64) -> InvoiceLineRecord {
        InvoiceLineRecord {
            product_id: 1,
            name: "Llanta 205/55 R16".to_string(),
            quantity,
            unit_price: 80.0,
            discount_percent,
            code: None,
            description: Some("205/55 R16 91V".to_string()),
        }
    }

    #[test]
    fn test_invoice_record_wire_shape() {
        let json = r#"{
            "invoiceNumber": "001-002-000000123",
            "lineItems": [
                {"productId": 7, "name": "Aceite", "quantity": 2, "unitPrice": 12.5}
            ]
        }"#;
        let record: InvoiceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.invoice_number, "001-002-000000123");
        assert_eq!(record.client_id, None);
        assert_eq!(record.general_discount_percent, 0.0);
        assert_eq!(record.line_items[0].product_id, 7);
        assert_eq!(record.line_items[0].discount_percent, 0.0);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_invoice_record_validation() {
        let record = InvoiceRecord {
            invoice_number: "F-1".to_string(),
            client_id: Some(3),
            general_discount_percent: 0.0,
            line_items: vec![record_line(0, 0.0)],
        };
        assert!(record.validate().is_err());

        let record = InvoiceRecord {
            line_items: vec![record_line(1, 120.0)],
            ..record
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_tax_mode_from_str() {
        assert_eq!("Legacy".parse::<TaxMode>(), Ok(TaxMode::Legacy));
        assert_eq!(" inclusive ".parse::<TaxMode>(), Ok(TaxMode::Inclusive));
        assert!("vat".parse::<TaxMode>().is_err());
    }

    #[test]
    fn test_line_changes_helpers() {
        assert!(LineChanges::default().is_empty());
        assert_eq!(LineChanges::quantity(3).quantity, Some(3));
        assert!(!LineChanges::unit_price(1.0).is_empty());
    }
}
