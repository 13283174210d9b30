//! Cross-Origin Policy
//!
//! Browsers get CORS headers for allow-listed origins only, and any request
//! carrying an `Origin` outside the list is refused outright (preflights
//! included). Requests without an `Origin` header, such as curl or Stripe's
//! webhook deliveries, pass through.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ConfigError;
use crate::error::ApiError;

/// Origins the storefront UI is served from
#[derive(Clone, Debug)]
pub struct AllowedOrigins(Arc<Vec<HeaderValue>>);

impl AllowedOrigins {
    pub fn parse(origins: &[String]) -> Result<Self, ConfigError> {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                    var: "ALLOWED_ORIGINS",
                    value: origin.clone(),
                    reason: "not a valid header value".into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(Arc::new(values)))
    }

    pub fn allows(&self, origin: &HeaderValue) -> bool {
        self.0.iter().any(|allowed| allowed == origin)
    }

    /// CORS headers for allow-listed origins
    pub fn cors_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.0.iter().cloned()))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
    }
}

/// Reject requests whose `Origin` is not allow-listed
pub async fn reject_unknown_origin(
    State(origins): State<AllowedOrigins>,
    request: Request,
    next: Next,
) -> Response {
    let Some(origin) = request.headers().get(header::ORIGIN) else {
        return next.run(request).await;
    };

    if origins.allows(origin) {
        return next.run(request).await;
    }

    let origin = origin.to_str().unwrap_or("<non-ascii>").to_string();
    tracing::warn!(origin = %origin, method = %request.method(), uri = %request.uri(), "Rejected cross-origin request");
    ApiError::OriginNotAllowed(origin).into_response()
}
