//! Checkout Session Request
//!
//! Everything the payments provider needs to open a hosted checkout page,
//! assembled from a validated cart. Provider-agnostic: the gateway crate maps
//! it onto the provider's wire types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::error::Result;
use crate::pricing::{self, LineItem, ShippingRule};

/// Where the provider sends the shopper afterwards
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutUrls {
    pub fn new(success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    /// `?success=true` / `?canceled=true` on the storefront root
    pub fn for_storefront(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self::new(
            format!("{base}/?success=true"),
            format!("{base}/?canceled=true"),
        )
    }
}

/// Per-deployment toggles passed through to the provider.
///
/// With automatic tax on, the provider may add tax on top of the locally
/// computed total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub automatic_tax: bool,
    pub collect_billing_address: bool,
    /// ISO country codes; empty disables shipping address collection
    pub shipping_countries: Vec<String>,
}

/// A one-time payment session request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionRequest {
    /// Cart lines, then the shipping line when one is charged
    pub line_items: Vec<LineItem>,
    pub urls: CheckoutUrls,
    pub options: SessionOptions,
    /// Reconciliation data echoed back on the completed event
    pub metadata: BTreeMap<String, String>,
    pub total_qty: u64,
    pub shipping_cents: i64,
    /// Locally computed total (before any provider-side tax)
    pub total_cents: i64,
}

impl SessionRequest {
    /// Price `cart` under `rule` and assemble the request
    pub fn build(
        cart: &Cart,
        rule: &ShippingRule,
        urls: &CheckoutUrls,
        options: &SessionOptions,
    ) -> Result<Self> {
        let priced = pricing::price_items(cart.items(), rule)?;
        let total_cents = priced.total_cents();

        let mut metadata = BTreeMap::new();
        metadata.insert("total_qty".to_string(), priced.total_qty.to_string());
        metadata.insert("shipping_cents".to_string(), priced.shipping_cents.to_string());

        Ok(Self {
            line_items: priced.line_items,
            urls: urls.clone(),
            options: options.clone(),
            metadata,
            total_qty: priced.total_qty,
            shipping_cents: priced.shipping_cents,
            total_cents,
        })
    }
}

/// Session created by the provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider session id
    pub id: String,

    /// Hosted checkout page to redirect the shopper to
    pub url: String,
}
