//! Server Configuration
//!
//! Everything comes from the environment (a `.env` file is loaded first by
//! `main`). The Stripe secret key is mandatory; the server refuses to start
//! without it.

use std::fmt;
use std::time::Duration;

use storefront_core::{CheckoutUrls, SessionOptions, ShippingRule};
use storefront_payments::DEFAULT_TIMEOUT_SECS;
use thiserror::Error;

const DEFAULT_PORT: u16 = 4242;
const DEFAULT_STOREFRONT_URL: &str = "http://localhost:5173";
const DEV_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
];

/// Fatal startup errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Resolved server settings
#[derive(Clone)]
pub struct ServerConfig {
    pub stripe_secret_key: String,
    /// `Some` iff the webhook endpoint is enabled
    pub webhook_secret: Option<String>,
    pub bind_host: String,
    pub port: u16,
    pub urls: CheckoutUrls,
    pub allowed_origins: Vec<String>,
    pub shipping: ShippingRule,
    pub session_options: SessionOptions,
    pub provider_timeout: Duration,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("stripe_secret_key", &"<redacted>")
            .field("webhooks_enabled", &self.webhook_secret.is_some())
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("urls", &self.urls)
            .field("allowed_origins", &self.allowed_origins)
            .field("shipping", &self.shipping)
            .field("session_options", &self.session_options)
            .field("provider_timeout", &self.provider_timeout)
            .finish()
    }
}

impl ServerConfig {
    /// Load from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let stripe_secret_key =
            get("STRIPE_SECRET_KEY").ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?;

        let webhook_secret = get("STRIPE_WEBHOOK_SECRET");
        let webhooks_enabled = match get("WEBHOOKS_ENABLED") {
            Some(value) => parse_bool("WEBHOOKS_ENABLED", &value)?,
            None => webhook_secret.is_some(),
        };
        let webhook_secret = if webhooks_enabled {
            Some(webhook_secret.ok_or(ConfigError::Missing("STRIPE_WEBHOOK_SECRET"))?)
        } else {
            None
        };

        let bind_host = get("BIND_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match get("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::invalid("PORT", &value, "expected a port number"))?,
            None => DEFAULT_PORT,
        };

        let storefront_url = get("STOREFRONT_URL")
            .unwrap_or_else(|| DEFAULT_STOREFRONT_URL.into())
            .trim_end_matches('/')
            .to_string();
        let defaults = CheckoutUrls::for_storefront(&storefront_url);
        let urls = CheckoutUrls::new(
            get("SUCCESS_URL").unwrap_or(defaults.success_url),
            get("CANCEL_URL").unwrap_or(defaults.cancel_url),
        );

        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(list) => split_list(&list)
                .map(|origin| origin.trim_end_matches('/').to_string())
                .collect(),
            None => {
                let mut origins: Vec<String> = DEV_ORIGINS.iter().map(ToString::to_string).collect();
                if !origins.contains(&storefront_url) {
                    origins.push(storefront_url);
                }
                origins
            }
        };

        let default_rule = ShippingRule::default();
        let free_threshold_qty = match get("SHIPPING_FREE_THRESHOLD") {
            Some(value) => value.parse().map_err(|_| {
                ConfigError::invalid("SHIPPING_FREE_THRESHOLD", &value, "expected a whole number")
            })?,
            None => default_rule.free_threshold_qty,
        };
        let per_unit_fee_cents = match get("SHIPPING_PER_UNIT_CENTS") {
            Some(value) => value
                .parse::<i64>()
                .ok()
                .filter(|fee| *fee >= 0)
                .ok_or_else(|| {
                    ConfigError::invalid("SHIPPING_PER_UNIT_CENTS", &value, "expected cents >= 0")
                })?,
            None => default_rule.per_unit_fee_cents,
        };

        let shipping_countries = match get("SHIPPING_COUNTRIES") {
            Some(list) => split_list(&list)
                .map(|code| {
                    storefront_payments::allowed_country(code)
                        .map(|_| code.to_uppercase())
                        .map_err(|e| ConfigError::invalid("SHIPPING_COUNTRIES", code, e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let session_options = SessionOptions {
            automatic_tax: get_bool(&get, "STRIPE_AUTOMATIC_TAX")?,
            collect_billing_address: get_bool(&get, "COLLECT_BILLING_ADDRESS")?,
            shipping_countries,
        };

        let provider_timeout = match get("PROVIDER_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    ConfigError::invalid("PROVIDER_TIMEOUT_SECS", &value, "expected seconds > 0")
                })?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            stripe_secret_key,
            webhook_secret,
            bind_host,
            port,
            urls,
            allowed_origins,
            shipping: ShippingRule::new(free_threshold_qty, per_unit_fee_cents),
            session_options,
            provider_timeout,
        })
    }

    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|item| !item.is_empty())
}

fn get_bool(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<bool, ConfigError> {
    get(var).map_or(Ok(false), |value| parse_bool(var, &value))
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(var, value, "expected true or false")),
    }
}
