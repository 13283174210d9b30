//! # storefront-payments
//!
//! Stripe Checkout integration for the storefront.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────────┐     ┌─────────────┐
//! │ Storefront  │────▶│  Stripe Hosted  │────▶│ Storefront  │
//! │   (cart)    │     │  Checkout Page  │     │ (?success)  │
//! └─────────────┘     └─────────────────┘     └─────────────┘
//!                              │
//!                              ▼  checkout.session.completed
//!                     ┌─────────────────┐
//!                     │  POST /webhook  │
//!                     └─────────────────┘
//! ```
//!
//! Session creation goes through the [`CheckoutGateway`] trait so the server can
//! run against [`MockGateway`] in tests. Webhook deliveries are verified by
//! [`WebhookHandler`] over the raw request body before anything is parsed.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_payments::{CheckoutGateway, StripeClient};
//!
//! let client = StripeClient::new("sk_test_xxx");
//! let session = client.create_session(&request).await?;
//!
//! // Redirect shopper to: session.url
//! ```

mod checkout;
mod error;
mod gateway;
mod mock;
pub mod webhook;

pub use checkout::{DEFAULT_TIMEOUT_SECS, StripeClient, allowed_country};
pub use error::{PaymentError, Result};
pub use gateway::{CheckoutGateway, with_deadline};
pub use mock::MockGateway;
pub use webhook::{SIGNATURE_HEADER, WebhookEvent, WebhookHandler};
