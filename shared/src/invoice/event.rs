//! Change events - the session's audit trail records

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Change event type (wire tags are what the invoice server stores)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChangeEventType {
    #[serde(rename = "producto_agregado")]
    ItemAdded,
    #[serde(rename = "cantidad_modificada")]
    QuantityChanged,
    #[serde(rename = "precio_modificado")]
    PriceChanged,
    #[serde(rename = "descuento_modificado")]
    DiscountChanged,
    #[serde(rename = "producto_eliminado")]
    ItemRemoved,
    #[serde(rename = "descuento_general_modificado")]
    GeneralDiscountChanged,
    #[serde(rename = "cliente_modificado")]
    ClientChanged,
    #[serde(rename = "factura_anulada")]
    InvoiceVoided,
}

impl ChangeEventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ItemAdded => "producto_agregado",
            Self::QuantityChanged => "cantidad_modificada",
            Self::PriceChanged => "precio_modificado",
            Self::DiscountChanged => "descuento_modificado",
            Self::ItemRemoved => "producto_eliminado",
            Self::GeneralDiscountChanged => "descuento_general_modificado",
            Self::ClientChanged => "cliente_modificado",
            Self::InvoiceVoided => "factura_anulada",
        }
    }
}

impl std::fmt::Display for ChangeEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single field change (old -> new)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldChange {
    pub field: String,
    pub from: Value,
    pub to: Value,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// One entry of the audit trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Event unique ID (UUID v4)
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: ChangeEventType,
    /// Human-readable summary shown in the edit history
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl ChangeEvent {
    pub fn new(
        event_type: ChangeEventType,
        description: impl Into<String>,
        detail: Option<Value>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type,
            description: description.into(),
            detail,
            timestamp: crate::util::now_millis(),
        }
    }
}
