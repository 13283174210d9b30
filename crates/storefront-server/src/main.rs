//! Storefront checkout server
//!
//! Axum server that turns a posted cart into a Stripe Checkout session and
//! verifies Stripe webhook deliveries.

mod config;
mod cors;
mod error;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_payments::{StripeClient, WebhookHandler};

use crate::config::ServerConfig;
use crate::cors::AllowedOrigins;
use crate::state::{AppState, CheckoutPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment (before tracing so RUST_LOG from .env applies)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Missing secrets are fatal: refuse to run half-configured
    let config = ServerConfig::from_env()
        .inspect_err(|e| tracing::error!(error = %e, "Refusing to start"))
        .context("invalid configuration")?;
    let origins = AllowedOrigins::parse(&config.allowed_origins)
        .context("invalid ALLOWED_ORIGINS")?;

    tracing::debug!(?config, "Loaded configuration");

    // Initialize payments
    let gateway = StripeClient::new(&config.stripe_secret_key)
        .with_timeout(config.provider_timeout);
    let webhooks = config
        .webhook_secret
        .as_deref()
        .map(|secret| Arc::new(WebhookHandler::new(secret)));

    if webhooks.is_some() {
        tracing::info!("✓ Stripe webhooks enabled");
    } else {
        tracing::warn!("⚠ Stripe webhooks disabled - set STRIPE_WEBHOOK_SECRET to enable");
    }

    // Build application state
    let state = AppState {
        gateway: Arc::new(gateway),
        webhooks,
        checkout: Arc::new(CheckoutPolicy {
            shipping: config.shipping,
            urls: config.urls.clone(),
            options: config.session_options.clone(),
        }),
    };

    let app = routes::build_router(state, origins);

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Stripe server listening on http://{}", addr);
    tracing::info!(
        free_threshold_qty = config.shipping.free_threshold_qty,
        per_unit_fee_cents = config.shipping.per_unit_fee_cents,
        "Shipping policy"
    );
    tracing::info!("Allowed origins: {}", config.allowed_origins.join(", "));
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /                        - Liveness");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  POST /create-checkout-session - Create Stripe checkout");
    if config.webhook_secret.is_some() {
        tracing::info!("  POST /webhook                 - Stripe webhook");
    }
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
