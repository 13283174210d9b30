//! Payment Error Types

use std::time::Duration;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, PaymentError>;

/// Payment-related errors
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Stripe API error
    #[error("Stripe error: {0}")]
    Stripe(String),

    /// Stripe did not answer before the deadline
    #[error("Stripe did not respond within {0:?}")]
    Timeout(Duration),

    /// Webhook signature verification failed
    #[error("Webhook signature invalid: {0}")]
    WebhookSignature(String),

    /// Webhook payload parsing failed
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PaymentError {
    /// Get user-friendly message
    pub fn user_message(&self) -> &str {
        match self {
            PaymentError::Stripe(_) | PaymentError::Timeout(_) => {
                "Unable to create checkout session"
            }
            PaymentError::WebhookSignature(_) => "Invalid webhook signature",
            PaymentError::WebhookParse(_) => "Invalid webhook payload",
            PaymentError::Config(_) => "Service configuration error.",
        }
    }

    /// Upstream failure, as opposed to a bad request
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, PaymentError::Stripe(_) | PaymentError::Timeout(_))
    }
}
