//! Stock adjustment instructions produced at save time

use serde::{Deserialize, Serialize};

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    /// Goods return to inventory
    Entrada,
    /// Goods leave inventory
    Salida,
}

impl std::fmt::Display for StockDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entrada => f.write_str("entrada"),
            Self::Salida => f.write_str("salida"),
        }
    }
}

/// One inventory instruction; executed server-side, never persisted here
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustment {
    pub product_id: i64,
    pub name: String,
    pub direction: StockDirection,
    /// Always > 0
    pub quantity: i32,
    pub reason: String,
}

impl StockAdjustment {
    /// Signed effect on stock (+ for entrada, - for salida)
    pub fn signed_quantity(&self) -> i64 {
        match self.direction {
            StockDirection::Entrada => i64::from(self.quantity),
            StockDirection::Salida => -i64::from(self.quantity),
        }
    }
}
