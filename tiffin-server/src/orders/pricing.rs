//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to
//! `f64` for storage/serialization.

use rust_decimal::prelude::*;

use crate::db::models::OrderItem;
use crate::utils::AppError;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price per item
const MAX_PRICE: f64 = 1_000_000.0;
/// Maximum allowed quantity per item
const MAX_QUANTITY: i32 = 9999;

/// Priced order amounts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPricing {
    pub subtotal: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
}

#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a line item before pricing
pub fn validate_item(item: &OrderItem) -> Result<(), AppError> {
    require_finite(item.unit_price, "unit_price")?;
    if item.unit_price < 0.0 {
        return Err(AppError::validation(format!(
            "unit_price must be non-negative, got {}",
            item.unit_price
        )));
    }
    if item.unit_price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "unit_price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, item.unit_price
        )));
    }
    if item.quantity <= 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

fn round_money(value: Decimal) -> f64 {
    value
        .round_dp(DECIMAL_PLACES)
        .to_f64()
        .unwrap_or(0.0)
}

/// Items subtotal: sum(unit_price * quantity), 2dp half-up
pub fn subtotal(items: &[OrderItem]) -> f64 {
    let sum = items
        .iter()
        .map(|item| to_decimal(item.unit_price) * Decimal::from(item.quantity))
        .sum::<Decimal>();
    round_money(sum)
}

/// Price a full order
///
/// 配送费规则：达标金额大于等于 `free_threshold` 时免配送费，否则收
/// 固定 `flat_fee`。达标金额取本单小计与合并结算金额中的较大者——
/// 合并金额只能帮订单达标，不能让本就达标的订单反而收费。
pub fn price_order(
    items: &[OrderItem],
    combined_total: Option<f64>,
    free_threshold: f64,
    flat_fee: f64,
) -> Result<OrderPricing, AppError> {
    if items.is_empty() {
        return Err(AppError::validation("Order must contain at least one item"));
    }
    for item in items {
        validate_item(item)?;
    }
    if let Some(combined) = combined_total {
        require_finite(combined, "combined_total_amount")?;
        if combined < 0.0 {
            return Err(AppError::validation(
                "combined_total_amount must be non-negative",
            ));
        }
    }

    let subtotal = subtotal(items);
    let qualifying_total = combined_total.map_or(subtotal, |combined| combined.max(subtotal));
    let delivery_fee = if qualifying_total >= free_threshold {
        0.0
    } else {
        flat_fee
    };
    let total_amount = round_money(to_decimal(subtotal) + to_decimal(delivery_fee));

    Ok(OrderPricing {
        subtotal,
        delivery_fee,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, unit_price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            name: name.to_string(),
            unit_price,
            quantity,
            image_ref: None,
        }
    }

    #[test]
    fn test_subtotal_450_pays_flat_fee() {
        let items = vec![item("Thali", 150.0, 3)];
        let pricing = price_order(&items, None, 500.0, 40.0).unwrap();
        assert_eq!(pricing.subtotal, 450.0);
        assert_eq!(pricing.delivery_fee, 40.0);
        assert_eq!(pricing.total_amount, 490.0);
    }

    #[test]
    fn test_subtotal_600_is_free_delivery() {
        let items = vec![item("Biryani", 300.0, 2)];
        let pricing = price_order(&items, None, 500.0, 40.0).unwrap();
        assert_eq!(pricing.subtotal, 600.0);
        assert_eq!(pricing.delivery_fee, 0.0);
        assert_eq!(pricing.total_amount, 600.0);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let items = vec![item("Combo", 500.0, 1)];
        let pricing = price_order(&items, None, 500.0, 40.0).unwrap();
        assert_eq!(pricing.delivery_fee, 0.0);
    }

    #[test]
    fn test_combined_total_waives_fee_for_small_sibling() {
        // 小额子单本身不达标，但整次结算达标
        let items = vec![item("Lassi", 80.0, 2)];
        let pricing = price_order(&items, Some(720.0), 500.0, 40.0).unwrap();
        assert_eq!(pricing.subtotal, 160.0);
        assert_eq!(pricing.delivery_fee, 0.0);
        assert_eq!(pricing.total_amount, 160.0);
    }

    #[test]
    fn test_low_combined_total_cannot_revoke_free_delivery() {
        // 自身已达标的订单，偏小的合并金额不能反过来收配送费
        let items = vec![item("Biryani", 300.0, 2)];
        let pricing = price_order(&items, Some(300.0), 500.0, 40.0).unwrap();
        assert_eq!(pricing.subtotal, 600.0);
        assert_eq!(pricing.delivery_fee, 0.0);
        assert_eq!(pricing.total_amount, 600.0);
    }

    #[test]
    fn test_total_equals_subtotal_plus_fee() {
        let items = vec![item("Dosa", 120.5, 2), item("Chai", 25.25, 3)];
        let pricing = price_order(&items, None, 500.0, 40.0).unwrap();
        assert_eq!(pricing.subtotal, 316.75);
        assert_eq!(pricing.total_amount, pricing.subtotal + pricing.delivery_fee);
    }

    #[test]
    fn test_rejects_empty_and_invalid_items() {
        assert!(price_order(&[], None, 500.0, 40.0).is_err());
        assert!(price_order(&[item("x", -1.0, 1)], None, 500.0, 40.0).is_err());
        assert!(price_order(&[item("x", 10.0, 0)], None, 500.0, 40.0).is_err());
        assert!(price_order(&[item("x", f64::NAN, 1)], None, 500.0, 40.0).is_err());
    }
}
