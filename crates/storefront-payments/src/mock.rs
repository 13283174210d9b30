//! Mock Checkout Gateway
//!
//! For testing and local demos. Records every request and answers with a
//! fake hosted-checkout URL, or a canned provider error.

use async_trait::async_trait;
use storefront_core::{CheckoutSession, SessionRequest};
use tokio::sync::Mutex;

use crate::error::{PaymentError, Result};
use crate::gateway::CheckoutGateway;

/// Mock gateway that never leaves the process
#[derive(Debug, Default)]
pub struct MockGateway {
    /// Provider message to fail with, if any
    failure: Option<String>,
    requests: Mutex<Vec<SessionRequest>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway whose every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            requests: Mutex::default(),
        }
    }

    /// Number of session-creation calls received
    pub async fn calls(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Most recent request, if any
    pub async fn last_request(&self) -> Option<SessionRequest> {
        self.requests.lock().await.last().cloned()
    }
}

#[async_trait]
impl CheckoutGateway for MockGateway {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession> {
        self.requests.lock().await.push(request.clone());

        if let Some(message) = &self.failure {
            return Err(PaymentError::Stripe(message.clone()));
        }

        let id = format!("cs_test_{}", uuid::Uuid::new_v4().simple());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.com/c/pay/{id}"),
            id,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
