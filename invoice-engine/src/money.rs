//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts are stored as `f64` on line items and totals; every calculation
//! goes through `Decimal` and is rounded back to 2 decimal places.
//!
//! This module is also the Totals Calculator: [`calculate_totals`] is pure
//! and returns identical results for identical inputs.

use rust_decimal::prelude::*;
use shared::invoice::{InvoiceTotals, LineItem, TaxMode};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tax rate applied on top of the net amount in legacy mode (13%)
pub const LEGACY_TAX_RATE: Decimal = Decimal::from_parts(13, 0, 0, false, 2);

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum unit price per line
pub const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum quantity per line
pub const MAX_QUANTITY: i32 = 9999;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

#[inline]
fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

// ============================================================================
// Input correction
// ============================================================================
//
// Bad edit input is corrected, never rejected.

/// Quantity lives in [1, MAX_QUANTITY]
#[inline]
pub fn clamp_quantity(quantity: i32) -> i32 {
    quantity.clamp(1, MAX_QUANTITY)
}

/// Percentages live in [0, 100]; NaN becomes 0
#[inline]
pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else if percent == f64::INFINITY {
        100.0
    } else {
        0.0
    }
}

/// Prices live in [0, MAX_PRICE]; NaN becomes 0
///
/// The bounds keep every line and invoice total inside `Decimal` range.
#[inline]
pub fn clamp_price(price: f64) -> f64 {
    if price.is_nan() {
        0.0
    } else {
        price.clamp(0.0, MAX_PRICE)
    }
}

// ============================================================================
// Line and invoice totals
// ============================================================================

/// Recompute `discount_amount` and `subtotal` from quantity, price and discount
///
/// Formula: subtotal = quantity * unit_price * (1 - discount_percent/100)
pub fn recalculate_line(item: &mut LineItem) {
    let gross = to_decimal(item.unit_price) * Decimal::from(item.quantity);
    let discount = round_money(gross * to_decimal(item.discount_percent) / Decimal::ONE_HUNDRED);
    item.discount_amount = to_f64(discount);
    item.subtotal = to_f64(round_money(gross) - discount);
}

/// Calculate invoice totals from line subtotals and the general discount
///
/// - subtotal: sum of line subtotals
/// - general_discount_amount: subtotal * pct / 100
/// - net: subtotal - general_discount_amount
/// - total: net (inclusive) or net + 13% of net (legacy)
pub fn calculate_totals(
    items: &[LineItem],
    general_discount_percent: f64,
    tax_mode: TaxMode,
) -> InvoiceTotals {
    let general_discount_percent = clamp_percent(general_discount_percent);

    let subtotal: Decimal = items.iter().map(|item| to_decimal(item.subtotal)).sum();
    let subtotal = round_money(subtotal);
    let general_discount =
        round_money(subtotal * to_decimal(general_discount_percent) / Decimal::ONE_HUNDRED);
    let net = subtotal - general_discount;

    let tax = match tax_mode {
        TaxMode::Inclusive => Decimal::ZERO,
        TaxMode::Legacy => round_money(net * LEGACY_TAX_RATE),
    };

    InvoiceTotals {
        subtotal: to_f64(subtotal),
        general_discount_percent,
        general_discount_amount: to_f64(general_discount),
        net: to_f64(net),
        tax_amount: to_f64(tax),
        total: to_f64(net + tax),
        tax_mode,
    }
}

/// Check whether two monetary values are equal within tolerance
pub fn money_eq(a: f64, b: f64) -> bool {
    (to_decimal(a) - to_decimal(b)).abs() < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, quantity: i32, unit_price: f64, discount_percent: f64) -> LineItem {
        let mut item = LineItem {
            product_id,
            name: format!("Product {}", product_id),
            quantity,
            unit_price,
            discount_percent,
            discount_amount: 0.0,
            subtotal: 0.0,
            code: None,
            description: None,
        };
        recalculate_line(&mut item);
        item
    }

    #[test]
    fn test_recalculate_line_without_discount() {
        let item = line(1, 3, 10.0, 0.0);
        assert_eq!(item.discount_amount, 0.0);
        assert_eq!(item.subtotal, 30.0);
    }

    #[test]
    fn test_recalculate_line_with_discount() {
        let item = line(1, 2, 19.99, 10.0);
        // 39.98 * 10% = 3.998 -> 4.00
        assert_eq!(item.discount_amount, 4.0);
        assert_eq!(item.subtotal, 35.98);
    }

    #[test]
    fn test_recalculate_line_avoids_float_drift() {
        let item = line(1, 3, 0.1, 0.0);
        assert_eq!(item.subtotal, 0.3);
    }

    #[test]
    fn test_full_discount_is_free() {
        let item = line(1, 5, 12.34, 100.0);
        assert_eq!(item.subtotal, 0.0);
        assert_eq!(item.discount_amount, 61.7);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(-4), 1);
        assert_eq!(clamp_quantity(7), 7);
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(150.0), 100.0);
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 100.0);
        assert_eq!(clamp_price(-1.0), 0.0);
        assert_eq!(clamp_price(f64::NAN), 0.0);
        assert_eq!(clamp_price(2.5), 2.5);
    }

    #[test]
    fn test_clamps_upper_bounds() {
        assert_eq!(clamp_quantity(i32::MAX), MAX_QUANTITY);
        assert_eq!(clamp_quantity(MAX_QUANTITY), MAX_QUANTITY);
        assert_eq!(clamp_price(1.0e20), MAX_PRICE);
        assert_eq!(clamp_price(1.0e30), MAX_PRICE);
        assert_eq!(clamp_price(f64::INFINITY), MAX_PRICE);
        assert_eq!(clamp_price(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_largest_line_stays_exact() {
        let item = line(1, MAX_QUANTITY, MAX_PRICE, 0.0);
        assert_eq!(item.subtotal, 9_999_000_000.0);
        let totals = calculate_totals(&[item], 0.0, TaxMode::Legacy);
        assert_eq!(totals.total, 11_298_870_000.0);
    }

    #[test]
    fn test_totals_inclusive_without_discount_equals_line_sum() {
        let items = vec![line(1, 2, 10.0, 0.0), line(2, 1, 5.0, 10.0)];
        let totals = calculate_totals(&items, 0.0, TaxMode::Inclusive);
        let line_sum: f64 = items.iter().map(|i| i.subtotal).sum();
        assert!(money_eq(totals.total, line_sum));
        assert_eq!(totals.subtotal, 24.5);
        assert_eq!(totals.tax_amount, 0.0);
        assert_eq!(totals.total, 24.5);
    }

    #[test]
    fn test_totals_general_discount() {
        let items = vec![line(1, 4, 25.0, 0.0)];
        let totals = calculate_totals(&items, 15.0, TaxMode::Inclusive);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.general_discount_amount, 15.0);
        assert_eq!(totals.net, 85.0);
        assert_eq!(totals.total, 85.0);
    }

    #[test]
    fn test_totals_legacy_adds_tax_on_net() {
        let items = vec![line(1, 4, 25.0, 0.0)];
        let totals = calculate_totals(&items, 10.0, TaxMode::Legacy);
        assert_eq!(totals.net, 90.0);
        assert_eq!(totals.tax_amount, 11.7);
        assert_eq!(totals.total, 101.7);
        assert_eq!(totals.tax_mode, TaxMode::Legacy);
    }

    #[test]
    fn test_totals_is_idempotent() {
        let items = vec![line(1, 3, 3.33, 5.0), line(2, 7, 1.11, 0.0)];
        let first = calculate_totals(&items, 7.5, TaxMode::Legacy);
        let second = calculate_totals(&items, 7.5, TaxMode::Legacy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_totals_empty_invoice() {
        let totals = calculate_totals(&[], 50.0, TaxMode::Legacy);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.total, 0.0);
    }
}
