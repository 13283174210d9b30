//! # storefront-core
//!
//! Pricing and checkout-request logic for the storefront.
//!
//! ## Pipeline
//!
//! ```text
//! JSON body ──▶ validate ──▶ Cart ──▶ line items ──▶ + shipping ──▶ SessionRequest
//!                  │                                     │
//!              CartError                           ShippingRule
//! ```
//!
//! Nothing here performs I/O; the provider call lives in `storefront-payments`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_core::{parse_checkout_body, CheckoutUrls, SessionOptions, SessionRequest, ShippingRule};
//!
//! let cart = parse_checkout_body(br#"{"items":[{"id":"lemon-bar","name":"Lemon Bar","price":8.25,"qty":2}]}"#)?;
//! let request = SessionRequest::build(
//!     &cart,
//!     &ShippingRule::default(),
//!     &CheckoutUrls::for_storefront("https://shop.example.com"),
//!     &SessionOptions::default(),
//! )?;
//! assert_eq!(request.shipping_cents, 600);
//! ```

pub mod cart;
pub mod error;
pub mod pricing;
pub mod session;
pub mod validate;

pub use cart::{Cart, CartItem, CartQuote, Product};
pub use error::{CartError, Result};
pub use pricing::{LineItem, PricedCart, ShippingRule};
pub use session::{CheckoutSession, CheckoutUrls, SessionOptions, SessionRequest};
pub use validate::{parse_checkout_body, parse_checkout_payload};
