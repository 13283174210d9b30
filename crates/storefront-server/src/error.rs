//! HTTP Error Mapping

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use storefront_core::CartError;
use storefront_payments::PaymentError;
use thiserror::Error;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }
}

/// Errors surfaced by the HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client sent an unusable cart
    #[error(transparent)]
    InvalidCart(#[from] CartError),

    /// Provider, webhook or configuration failure
    #[error(transparent)]
    Payment(#[from] PaymentError),

    /// Webhook request without a usable signature header
    #[error("{0}")]
    MissingSignature(String),

    /// `Origin` header not on the allow-list
    #[error("Origin not allowed: {0}")]
    OriginNotAllowed(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidCart(err) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(err.to_string()))).into_response()
            }

            ApiError::Payment(
                err @ (PaymentError::WebhookSignature(_) | PaymentError::WebhookParse(_)),
            ) => webhook_error(&err.to_string()),

            ApiError::Payment(err) if err.is_provider_failure() => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: err.user_message().to_string(),
                    message: Some(err.to_string()),
                }),
            )
                .into_response(),

            ApiError::Payment(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(err.user_message())),
            )
                .into_response(),

            ApiError::MissingSignature(detail) => webhook_error(&detail),

            ApiError::OriginNotAllowed(_) => (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new("Origin not allowed")),
            )
                .into_response(),
        }
    }
}

/// Plain-text 400 in the shape Stripe's dashboard shows back
fn webhook_error(detail: &str) -> Response {
    (StatusCode::BAD_REQUEST, format!("Webhook Error: {detail}")).into_response()
}
