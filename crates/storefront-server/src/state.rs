//! Application State

use std::sync::Arc;

use storefront_core::{CheckoutUrls, SessionOptions, ShippingRule};
use storefront_payments::{CheckoutGateway, WebhookHandler};

/// Pricing policy and session settings, fixed at startup
#[derive(Clone, Debug)]
pub struct CheckoutPolicy {
    pub shipping: ShippingRule,
    pub urls: CheckoutUrls,
    pub options: SessionOptions,
}

/// Shared application state (immutable; no per-request data lives here)
#[derive(Clone)]
pub struct AppState {
    /// Payments provider (Stripe in production, mock in tests)
    pub gateway: Arc<dyn CheckoutGateway>,

    /// Webhook verifier (None when webhooks are disabled)
    pub webhooks: Option<Arc<WebhookHandler>>,

    pub checkout: Arc<CheckoutPolicy>,
}
