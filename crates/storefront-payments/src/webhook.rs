//! Stripe Webhook Handling
//!
//! Verifies signed Stripe events and reacts to completed checkouts.
//!
//! The signature covers the byte-exact request body, so callers must hand
//! over the raw bytes before anything parses or re-serializes them:
//!
//! ```text
//! Stripe-Signature: t=1700000000,v1=<hex hmac-sha256(secret, "t.<body>")>
//! ```

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::error::{PaymentError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a signed timestamp (5 minutes)
pub const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Event kind the storefront acts on
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Shopper finished paying on the hosted page
    CheckoutCompleted {
        event_id: String,
        session_id: String,
        customer_email: Option<String>,
        amount_total_cents: i64,
    },

    /// Any other event kind: acknowledged, ignored
    Other {
        event_id: String,
        event_type: String,
    },
}

impl WebhookEvent {
    /// Stripe event type string
    pub fn kind(&self) -> &str {
        match self {
            WebhookEvent::CheckoutCompleted { .. } => CHECKOUT_COMPLETED,
            WebhookEvent::Other { event_type, .. } => event_type,
        }
    }
}

/// Verifies and dispatches webhook deliveries
pub struct WebhookHandler {
    secret: String,
    tolerance_secs: u64,
}

impl std::fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookHandler")
            .field("secret", &"<redacted>")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

impl WebhookHandler {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Verify signature and parse event
    pub fn parse_event(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent> {
        self.parse_event_at(payload, signature, Utc::now().timestamp())
    }

    /// [`parse_event`](Self::parse_event) against an explicit clock
    pub fn parse_event_at(&self, payload: &[u8], signature: &str, now: i64) -> Result<WebhookEvent> {
        let header = parse_signature_header(signature)?;

        if now.abs_diff(header.timestamp) > self.tolerance_secs {
            return Err(PaymentError::WebhookSignature(
                "Timestamp outside tolerance".into(),
            ));
        }

        let valid = header
            .signatures
            .iter()
            .any(|sig| signature_matches(&self.secret, header.timestamp, payload, sig));

        if !valid {
            return Err(PaymentError::WebhookSignature(
                "No signatures found matching the expected signature for payload".into(),
            ));
        }

        parse_webhook_event(payload)
    }

    /// Verify, parse, then react to a delivery
    pub fn handle(&self, payload: &[u8], signature: &str) -> Result<WebhookEvent> {
        let event = self.parse_event(payload, signature)?;

        match &event {
            WebhookEvent::CheckoutCompleted {
                event_id,
                session_id,
                customer_email,
                amount_total_cents,
            } => {
                tracing::info!(
                    event_id = %event_id,
                    session_id = %session_id,
                    email = ?customer_email,
                    amount_total_cents = *amount_total_cents,
                    "Checkout session completed"
                );
            }

            WebhookEvent::Other { event_id, event_type } => {
                tracing::debug!(event_id = %event_id, event_type = %event_type, "Unhandled webhook event");
            }
        }

        Ok(event)
    }
}

/// Build a `Stripe-Signature` header value for `payload`.
///
/// Used by tests and local tooling that replays events.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Result<String> {
    let digest = signer(secret, timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
}

fn signer(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(format!("invalid webhook secret: {e}")))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Constant-time check of one hex signature
fn signature_matches(secret: &str, timestamp: i64, payload: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };
    signer(secret, timestamp, payload)
        .is_ok_and(|mac| mac.verify_slice(&expected).is_ok())
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookSignature("Unable to extract timestamp from header".into())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookSignature(
            "No v1 signature found in header".into(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

/// Parse a verified payload into our event type
fn parse_webhook_event(payload: &[u8]) -> Result<WebhookEvent> {
    let event: StripeEvent = serde_json::from_slice(payload)
        .map_err(|e| PaymentError::WebhookParse(e.to_string()))?;

    if event.event_type != CHECKOUT_COMPLETED {
        return Ok(WebhookEvent::Other {
            event_id: event.id,
            event_type: event.event_type,
        });
    }

    let object = &event.data.object;
    let session_id = object
        .get("id")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| PaymentError::WebhookParse("Invalid checkout session data".into()))?
        .to_string();

    let customer_email = object
        .get("customer_details")
        .and_then(|details| details.get("email"))
        .or_else(|| object.get("customer_email"))
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    let amount_total_cents = object
        .get("amount_total")
        .and_then(serde_json::Value::as_i64)
        .unwrap_or_default();

    Ok(WebhookEvent::CheckoutCompleted {
        event_id: event.id,
        session_id,
        customer_email,
        amount_total_cents,
    })
}
