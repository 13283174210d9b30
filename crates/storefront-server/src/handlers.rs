//! HTTP Handlers

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;
use storefront_core::{SessionRequest, parse_checkout_body};
use storefront_payments::{SIGNATURE_HEADER, WebhookHandler};

use crate::error::ApiError;
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub webhooks_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness text, handy from a browser
pub async fn root() -> &'static str {
    "Stripe backend is running."
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.gateway.name().to_string(),
        webhooks_enabled: state.webhooks.is_some(),
    })
}

/// Create a hosted checkout session for the posted cart
pub async fn create_checkout_session(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let cart = parse_checkout_body(&body).inspect_err(|e| {
        tracing::warn!(
            error = %e,
            body = %String::from_utf8_lossy(&body),
            "Rejected checkout cart"
        );
    })?;

    let policy = &state.checkout;
    let request = SessionRequest::build(&cart, &policy.shipping, &policy.urls, &policy.options)?;

    tracing::debug!(
        items = cart.len(),
        total_qty = request.total_qty,
        shipping_cents = request.shipping_cents,
        total_cents = request.total_cents,
        "Creating checkout session"
    );

    let session = state.gateway.create_session(&request).await.inspect_err(|e| {
        tracing::error!(
            error = %e,
            provider = state.gateway.name(),
            cart = ?cart.items(),
            line_items = ?request.line_items,
            "Checkout error"
        );
    })?;

    tracing::info!(session_id = %session.id, total_cents = request.total_cents, "Checkout session ready");

    Ok(Json(CheckoutResponse { url: session.url }))
}

/// Stripe webhook handler, mounted only when a webhook secret is configured.
///
/// Takes the body as raw `Bytes`: the signature covers the exact bytes Stripe
/// sent, so nothing may decode the body before verification.
pub async fn stripe_webhook(
    State(handler): State<Arc<WebhookHandler>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::MissingSignature("Missing Stripe-Signature header".into()))?;

    handler.handle(&body, signature).inspect_err(|e| {
        tracing::warn!(error = %e, "Webhook verification failed");
    })?;

    Ok(Json(WebhookAck { received: true }))
}
