//! Checkout Gateway Strategy
//!
//! The one seam between the storefront and its payments provider.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        CheckoutGateway (trait)           │
//! │  └── create_session(SessionRequest)      │
//! └──────────────────────────────────────────┘
//!                     ▲
//!          ┌──────────┴──────────┐
//!  ┌───────┴───────┐     ┌───────┴───────┐
//!  │ StripeClient  │     │  MockGateway  │
//!  └───────────────┘     └───────────────┘
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use storefront_core::{CheckoutSession, SessionRequest};

use crate::error::{PaymentError, Result};

/// Creates hosted checkout sessions.
///
/// Implementations must not retry on their own: a repeated call may open a
/// second session for the same cart.
#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    /// Open a one-time payment session and return its redirect URL
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession>;

    /// Provider name (for logging)
    fn name(&self) -> &str;
}

/// Run a single provider call under `deadline`.
///
/// An overrun becomes [`PaymentError::Timeout`]; the call is dropped, not retried.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| PaymentError::Timeout(deadline))?
}
