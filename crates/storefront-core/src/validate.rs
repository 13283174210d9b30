//! Checkout Payload Validation
//!
//! Turns the JSON body posted by the storefront into a [`Cart`]. Validation is
//! all-or-nothing: one bad entry rejects the whole cart.
//!
//! Coercion rules:
//!
//! - `items` must be a non-empty array
//! - `price` is a JSON number or numeric string, `>= 0`
//! - `qty` defaults to 1 when absent; otherwise an integer `>= 1`
//! - `name` is a non-empty string
//! - `id` is optional and falls back to `name`
//!
//! Unknown fields (description, image, stock) are ignored.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

use crate::cart::{Cart, CartItem};
use crate::error::{CartError, Result};
use crate::pricing;

/// Parse a raw request body
pub fn parse_checkout_body(body: &[u8]) -> Result<Cart> {
    let payload: Value =
        serde_json::from_slice(body).map_err(|e| CartError::InvalidJson(e.to_string()))?;
    parse_checkout_payload(&payload)
}

/// Validate an already-decoded payload
pub fn parse_checkout_payload(payload: &Value) -> Result<Cart> {
    let entries = payload
        .get("items")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty())
        .ok_or(CartError::NoItems)?;

    let items = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_item(index, entry))
        .collect::<Result<Vec<_>>>()?;

    Cart::try_from_items(items)
}

fn parse_item(index: usize, entry: &Value) -> Result<CartItem> {
    let fields = entry
        .as_object()
        .ok_or_else(|| CartError::item(index, "expected an object"))?;

    let name = match fields.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(CartError::item(index, "name is required")),
    };

    let id = match fields.get("id") {
        None | Some(Value::Null) => name.clone(),
        Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
        Some(Value::Number(id)) => id.to_string(),
        Some(_) => return Err(CartError::item(index, "id must be a non-empty string")),
    };

    let price = fields
        .get("price")
        .and_then(coerce_price)
        .ok_or_else(|| CartError::item(index, "price must be a non-negative number"))?;

    if pricing::unit_amount_cents(price).is_none() {
        return Err(CartError::item(index, "price out of range"));
    }

    let qty = match fields.get("qty") {
        None | Some(Value::Null) => 1,
        Some(value) => coerce_qty(value)
            .ok_or_else(|| CartError::item(index, "qty must be a whole number of at least 1"))?,
    };

    Ok(CartItem {
        id,
        name,
        price,
        qty,
    })
}

fn coerce_price(value: &Value) -> Option<Decimal> {
    let price = match value {
        Value::Number(n) => parse_decimal(&n.to_string())?,
        Value::String(s) => parse_decimal(s.trim())?,
        _ => return None,
    };

    (price >= Decimal::ZERO).then_some(price)
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn coerce_qty(value: &Value) -> Option<u32> {
    let qty = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };

    u32::try_from(qty).ok().filter(|qty| *qty >= 1)
}
