//! Stripe Checkout Integration
//!
//! Implements the "Stripe Checkout (Hosted)" approach: the shopper is
//! redirected to a Stripe-hosted page and back to the storefront.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use storefront_core::{CheckoutSession, LineItem, SessionRequest};
use stripe::{
    CheckoutSession as StripeCheckoutSession, CheckoutSessionBillingAddressCollection,
    CheckoutSessionMode, Client, CreateCheckoutSession, CreateCheckoutSessionAutomaticTax,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    CreateCheckoutSessionShippingAddressCollection,
    CreateCheckoutSessionShippingAddressCollectionAllowedCountries, Currency,
};

use crate::error::{PaymentError, Result};
use crate::gateway::{CheckoutGateway, with_deadline};

/// Default deadline for a session-creation call
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stripe client wrapper
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    timeout: Duration,
}

impl fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl StripeClient {
    /// Create a new Stripe client
    pub fn new(secret_key: &str) -> Self {
        Self {
            client: Client::new(secret_key),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Override the session-creation deadline
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CheckoutGateway for StripeClient {
    async fn create_session(&self, request: &SessionRequest) -> Result<CheckoutSession> {
        let params = session_params(request)?;

        // Single attempt: a retried create can open a duplicate session.
        let session = with_deadline(self.timeout, async {
            StripeCheckoutSession::create(&self.client, params)
                .await
                .map_err(|e| PaymentError::Stripe(e.to_string()))
        })
        .await?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::Stripe("No checkout URL returned".into()))?;

        tracing::info!(
            session_id = %session.id,
            total_cents = request.total_cents,
            "Created Stripe checkout session"
        );

        Ok(CheckoutSession {
            id: session.id.to_string(),
            url,
        })
    }

    fn name(&self) -> &str {
        "stripe"
    }
}

/// Map a provider-agnostic request onto Stripe's create parameters
fn session_params(request: &SessionRequest) -> Result<CreateCheckoutSession<'_>> {
    let mut params = CreateCheckoutSession::new();
    params.mode = Some(CheckoutSessionMode::Payment);
    params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
    params.success_url = Some(&request.urls.success_url);
    params.cancel_url = Some(&request.urls.cancel_url);
    params.line_items = Some(request.line_items.iter().map(stripe_line_item).collect());

    let metadata: HashMap<String, String> = request
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    params.metadata = Some(metadata);

    let options = &request.options;
    if options.automatic_tax {
        params.automatic_tax = Some(CreateCheckoutSessionAutomaticTax {
            enabled: true,
            ..Default::default()
        });
    }
    if options.collect_billing_address {
        params.billing_address_collection = Some(CheckoutSessionBillingAddressCollection::Required);
    }
    if !options.shipping_countries.is_empty() {
        let allowed_countries = options
            .shipping_countries
            .iter()
            .map(String::as_str)
            .map(allowed_country)
            .collect::<Result<Vec<_>>>()?;
        params.shipping_address_collection =
            Some(CreateCheckoutSessionShippingAddressCollection { allowed_countries });
    }

    Ok(params)
}

fn stripe_line_item(line: &LineItem) -> CreateCheckoutSessionLineItems {
    CreateCheckoutSessionLineItems {
        quantity: Some(u64::from(line.quantity)),
        price_data: Some(CreateCheckoutSessionLineItemsPriceData {
            currency: Currency::USD,
            unit_amount: Some(line.unit_amount_cents),
            product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                name: line.product_name.clone(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Parse an ISO country code into Stripe's allowed-country enum
pub fn allowed_country(
    code: &str,
) -> Result<CreateCheckoutSessionShippingAddressCollectionAllowedCountries> {
    let normalized = code.trim().to_uppercase();
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| PaymentError::Config(format!("unsupported shipping country: {code}")))
}
