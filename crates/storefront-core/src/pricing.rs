//! Line Items & Shipping
//!
//! Converts cart entries into provider line items and applies the
//! threshold shipping rule.
//!
//! ```text
//!  total qty   0 ──── 1 ──── 2 ──── threshold ──── ...
//!  fee         0    1×fee  2×fee        0            0
//! ```
//!
//! Crossing the threshold zeroes the whole fee; it is not prorated.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::error::{CartError, Result};

/// Only currency the storefront sells in
pub const CURRENCY: &str = "usd";

/// Product name of the synthetic shipping line
pub const SHIPPING_LINE_NAME: &str = "Shipping";

/// A provider-side line item (amounts in cents)
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineItem {
    pub currency: &'static str,
    pub product_name: String,
    pub unit_amount_cents: i64,
    pub quantity: u32,
}

impl LineItem {
    /// Synthetic shipping line: quantity 1, unit amount = fee
    pub fn shipping(fee_cents: i64) -> Self {
        Self {
            currency: CURRENCY,
            product_name: SHIPPING_LINE_NAME.into(),
            unit_amount_cents: fee_cents,
            quantity: 1,
        }
    }

    /// Line total (unit amount × quantity)
    pub fn total_cents(&self) -> i64 {
        self.unit_amount_cents
            .saturating_mul(i64::from(self.quantity))
    }
}

/// Free-shipping threshold policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRule {
    /// Orders with at least this many units ship free
    pub free_threshold_qty: u64,

    /// Fee per unit below the threshold
    pub per_unit_fee_cents: i64,
}

impl Default for ShippingRule {
    fn default() -> Self {
        Self {
            free_threshold_qty: 3,
            per_unit_fee_cents: 300,
        }
    }
}

impl ShippingRule {
    pub fn new(free_threshold_qty: u64, per_unit_fee_cents: i64) -> Self {
        Self {
            free_threshold_qty,
            per_unit_fee_cents,
        }
    }

    /// Shipping fee for an order of `total_qty` units
    pub fn fee_cents(&self, total_qty: u64) -> i64 {
        if total_qty == 0 || total_qty >= self.free_threshold_qty {
            return 0;
        }

        let qty = i64::try_from(total_qty).unwrap_or(i64::MAX);
        qty.saturating_mul(self.per_unit_fee_cents)
    }
}

/// Convert a major-unit price into cents, rounding half away from zero.
///
/// Returns `None` when the amount does not fit in an `i64`.
pub fn unit_amount_cents(price: Decimal) -> Option<i64> {
    price
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Sum of quantities across the cart
pub fn total_quantity(items: &[CartItem]) -> u64 {
    items.iter().map(|item| u64::from(item.qty)).sum()
}

/// Map cart entries to line items, in cart order
pub fn build_line_items(items: &[CartItem]) -> Result<Vec<LineItem>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let unit_amount_cents = unit_amount_cents(item.price)
                .ok_or_else(|| CartError::item(index, "price out of range"))?;

            Ok(LineItem {
                currency: CURRENCY,
                product_name: item.name.clone(),
                unit_amount_cents,
                quantity: item.qty,
            })
        })
        .collect()
}

/// Line items plus the shipping figures they were priced with
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PricedCart {
    /// Cart lines followed by the shipping line (when charged)
    pub line_items: Vec<LineItem>,
    pub total_qty: u64,
    pub shipping_cents: i64,
}

impl PricedCart {
    /// Sum of every line, shipping included
    pub fn total_cents(&self) -> i64 {
        self.line_items
            .iter()
            .fold(0_i64, |acc, line| acc.saturating_add(line.total_cents()))
    }

    /// Sum of the cart lines, shipping excluded
    pub fn subtotal_cents(&self) -> i64 {
        self.total_cents().saturating_sub(self.shipping_cents)
    }
}

/// Full pricing pipeline: line items, shipping fee, optional shipping line
pub fn price_items(items: &[CartItem], rule: &ShippingRule) -> Result<PricedCart> {
    let mut line_items = build_line_items(items)?;
    let total_qty = total_quantity(items);
    let shipping_cents = rule.fee_cents(total_qty);

    if shipping_cents > 0 {
        line_items.push(LineItem::shipping(shipping_cents));
    }

    Ok(PricedCart {
        line_items,
        total_qty,
        shipping_cents,
    })
}
