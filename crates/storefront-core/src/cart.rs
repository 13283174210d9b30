//! Cart Model
//!
//! The cart lives with the client. This is the value type the client holds
//! between add-to-cart and checkout; the server only ever sees it as a
//! submitted payload.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CartError, Result};
use crate::pricing::{self, ShippingRule};

/// A catalog entry the shopper adds from
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Units on hand; the cart never holds more than this
    pub qty_available: u32,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, qty_available: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            qty_available,
        }
    }
}

/// One cart entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier (unique within a cart)
    pub id: String,

    /// Display name, sent to the provider as the product name
    pub name: String,

    /// Unit price in dollars
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Units, always >= 1
    pub qty: u32,
}

impl CartItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal, qty: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            qty,
        }
    }

    /// Price × quantity
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.qty)
    }
}

/// Totals shown to the shopper before checkout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CartQuote {
    pub total_qty: u64,
    pub subtotal_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,
}

/// Ordered cart with unique ids.
///
/// Deserializes from a plain item list through [`Cart::try_from_items`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl TryFrom<Vec<CartItem>> for Cart {
    type Error = CartError;

    fn try_from(items: Vec<CartItem>) -> Result<Self> {
        Self::try_from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from already-coerced entries.
    ///
    /// Repeated ids are merged into the first entry, the same as adding the
    /// product again. Rejects zero quantities, negative prices and repeated
    /// ids whose name or price differ.
    pub fn try_from_items(items: Vec<CartItem>) -> Result<Self> {
        let mut cart = Self::new();

        for (index, item) in items.into_iter().enumerate() {
            if item.qty == 0 {
                return Err(CartError::item(index, "qty must be at least 1"));
            }
            if item.price < Decimal::ZERO {
                return Err(CartError::item(index, "price must not be negative"));
            }

            match cart.items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) if existing.name == item.name && existing.price == item.price => {
                    existing.qty = existing
                        .qty
                        .checked_add(item.qty)
                        .ok_or_else(|| CartError::item(index, "qty is too large"))?;
                }
                Some(_) => return Err(CartError::DuplicateItem(item.id)),
                None => cart.items.push(item),
            }
        }

        Ok(cart)
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Units of `product` that can still be added
    pub fn remaining_for(&self, product: &Product) -> u32 {
        let in_cart = self.get(&product.id).map_or(0, |item| item.qty);
        product.qty_available.saturating_sub(in_cart)
    }

    /// Add one unit of `product`; an existing entry is incremented.
    ///
    /// Returns the entry's new quantity.
    pub fn add_product(&mut self, product: &Product) -> Result<u32> {
        if self.remaining_for(product) == 0 {
            return Err(CartError::OutOfStock {
                id: product.id.clone(),
                available: product.qty_available,
            });
        }

        if let Some(item) = self.items.iter_mut().find(|item| item.id == product.id) {
            item.qty += 1;
            return Ok(item.qty);
        }

        self.items.push(CartItem::new(
            product.id.clone(),
            product.name.clone(),
            product.price,
            1,
        ));
        Ok(1)
    }

    /// Shift an entry's quantity by `delta`, never below 1
    pub fn change_qty(&mut self, id: &str, delta: i64) -> Result<u32> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| CartError::ItemNotFound(id.to_string()))?;

        let next = i64::from(item.qty).saturating_add(delta).max(1);
        item.qty = u32::try_from(next).unwrap_or(u32::MAX);
        Ok(item.qty)
    }

    /// Drop an entry entirely
    pub fn remove(&mut self, id: &str) -> Option<CartItem> {
        let pos = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(pos))
    }

    pub fn total_qty(&self) -> u64 {
        pricing::total_quantity(&self.items)
    }

    /// Subtotal in dollars, before shipping
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Totals under `rule`, computed the same way the checkout prices them
    pub fn quote(&self, rule: &ShippingRule) -> Result<CartQuote> {
        let priced = pricing::price_items(&self.items, rule)?;

        Ok(CartQuote {
            total_qty: priced.total_qty,
            subtotal_cents: priced.subtotal_cents(),
            shipping_cents: priced.shipping_cents,
            total_cents: priced.total_cents(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lemon_bar() -> Product {
        Product::new("lemon-bar", "Lemon Bar", dec!(8.25), 2)
    }

    #[test]
    fn test_add_increments_existing() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_product(&lemon_bar()).unwrap(), 1);
        assert_eq!(cart.add_product(&lemon_bar()).unwrap(), 2);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_qty(), 2);
    }

    #[test]
    fn test_add_respects_stock() {
        let mut cart = Cart::new();
        let product = lemon_bar();
        cart.add_product(&product).unwrap();
        cart.add_product(&product).unwrap();

        assert_eq!(cart.remaining_for(&product), 0);
        assert_eq!(
            cart.add_product(&product),
            Err(CartError::OutOfStock {
                id: "lemon-bar".into(),
                available: 2
            })
        );
    }

    #[test]
    fn test_change_qty_clamps_at_one() {
        let mut cart = Cart::new();
        cart.add_product(&lemon_bar()).unwrap();

        assert_eq!(cart.change_qty("lemon-bar", 4).unwrap(), 5);
        assert_eq!(cart.change_qty("lemon-bar", -10).unwrap(), 1);
        assert!(matches!(
            cart.change_qty("brownie", 1),
            Err(CartError::ItemNotFound(_))
        ));
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add_product(&lemon_bar()).unwrap();
        assert!(cart.remove("lemon-bar").is_some());
        assert!(cart.remove("lemon-bar").is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quote_matches_checkout_pricing() {
        let mut cart = Cart::new();
        cart.add_product(&lemon_bar()).unwrap();
        cart.add_product(&lemon_bar()).unwrap();

        let quote = cart.quote(&ShippingRule::default()).unwrap();
        assert_eq!(quote.total_qty, 2);
        assert_eq!(quote.subtotal_cents, 1650);
        assert_eq!(quote.shipping_cents, 600);
        assert_eq!(quote.total_cents, 2250);
        assert_eq!(cart.subtotal(), dec!(16.50));
    }

    #[test]
    fn test_empty_cart_quote() {
        let quote = Cart::new().quote(&ShippingRule::default()).unwrap();
        assert_eq!(quote.total_cents, 0);
        assert_eq!(quote.shipping_cents, 0);
    }

    #[test]
    fn test_repeated_ids_merge() {
        let items = vec![
            CartItem::new("a", "A", dec!(1), 1),
            CartItem::new("b", "B", dec!(2), 1),
            CartItem::new("a", "A", dec!(1), 2),
        ];
        let cart = Cart::try_from_items(items).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0], CartItem::new("a", "A", dec!(1), 3));
        assert_eq!(cart.total_qty(), 4);
    }

    #[test]
    fn test_conflicting_ids_rejected() {
        let items = vec![
            CartItem::new("a", "A", dec!(1), 1),
            CartItem::new("a", "A", dec!(2), 1),
        ];
        assert_eq!(
            Cart::try_from_items(items),
            Err(CartError::DuplicateItem("a".into()))
        );
    }

    #[test]
    fn test_merge_overflow_rejected() {
        let items = vec![
            CartItem::new("a", "A", dec!(1), u32::MAX),
            CartItem::new("a", "A", dec!(1), 1),
        ];
        assert!(matches!(
            Cart::try_from_items(items),
            Err(CartError::InvalidItem { index: 1, .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let cart: Cart = serde_json::from_str(
            r#"[{"id":"a","name":"A","price":1.5,"qty":1},{"id":"a","name":"A","price":1.5,"qty":1}]"#,
        )
        .unwrap();
        assert_eq!(cart.total_qty(), 2);

        let zero_qty = serde_json::from_str::<Cart>(r#"[{"id":"a","name":"A","price":1.5,"qty":0}]"#);
        assert!(zero_qty.is_err());

        let negative = serde_json::from_str::<Cart>(r#"[{"id":"a","name":"A","price":-1,"qty":1}]"#);
        assert!(negative.is_err());
    }

    #[test]
    fn test_serialize_as_item_list() {
        let mut cart = Cart::new();
        cart.add_product(&lemon_bar()).unwrap();

        let value = serde_json::to_value(&cart).unwrap();
        assert!(value.is_array());
        assert_eq!(serde_json::from_value::<Cart>(value).unwrap(), cart);
    }
}
