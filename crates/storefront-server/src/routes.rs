//! Router Assembly

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::cors::{AllowedOrigins, reject_unknown_origin};
use crate::handlers::{create_checkout_session, health_check, root, stripe_webhook};
use crate::state::AppState;

/// Build the application router.
///
/// `/webhook` is mounted only when webhooks are enabled. It sits behind no
/// body-decoding layer: its handler receives the raw bytes it must verify.
pub fn build_router(state: AppState, origins: AllowedOrigins) -> Router {
    let api: Router<AppState> = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/create-checkout-session", post(create_checkout_session));

    let webhooks: Router<AppState> = match &state.webhooks {
        Some(handler) => Router::new()
            .route("/webhook", post(stripe_webhook))
            .with_state(handler.clone()),
        None => Router::new(),
    };

    // Outermost first: trace, refuse unknown origins, then CORS headers.
    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            origins.clone(),
            reject_unknown_origin,
        ))
        .layer(origins.cors_layer());

    api.merge(webhooks).layer(layers).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use storefront_core::{CheckoutUrls, SessionOptions, ShippingRule};
    use storefront_payments::{MockGateway, WebhookHandler, webhook::sign_payload};
    use tower::ServiceExt;

    use crate::state::CheckoutPolicy;

    const WEBHOOK_SECRET: &str = "whsec_test";
    const STOREFRONT: &str = "http://localhost:5173";

    struct TestApp {
        router: Router,
        gateway: Arc<MockGateway>,
    }

    fn app_with(gateway: MockGateway, webhooks: bool) -> TestApp {
        let gateway = Arc::new(gateway);
        let state = AppState {
            gateway: gateway.clone(),
            webhooks: webhooks.then(|| Arc::new(WebhookHandler::new(WEBHOOK_SECRET))),
            checkout: Arc::new(CheckoutPolicy {
                shipping: ShippingRule::default(),
                urls: CheckoutUrls::for_storefront(STOREFRONT),
                options: SessionOptions::default(),
            }),
        };
        let origins = AllowedOrigins::parse(&[STOREFRONT.to_string()]).unwrap();

        TestApp {
            router: build_router(state, origins),
            gateway,
        }
    }

    fn app() -> TestApp {
        app_with(MockGateway::new(), true)
    }

    fn checkout_request(body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/create-checkout-session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn webhook_request(body: &[u8], signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/webhook");
        if let Some(signature) = signature {
            builder = builder.header("stripe-signature", signature);
        }
        builder.body(Body::from(body.to_vec())).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    fn lemon_bars(qty: u32) -> Value {
        json!({"items": [{"id": "lemon-bar", "name": "Lemon Bar", "price": 8.25, "qty": qty}]})
    }

    #[tokio::test]
    async fn test_root_liveness() {
        let response = app()
            .router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Stripe backend is running.");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "mock");
        assert_eq!(body["webhooks_enabled"], true);
    }

    #[tokio::test]
    async fn test_checkout_returns_url_and_adds_shipping() {
        let app = app();
        let response = app.router.oneshot(checkout_request(&lemon_bars(2))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["url"].as_str().unwrap().starts_with("https://checkout.stripe.com/"));

        let request = app.gateway.last_request().await.unwrap();
        assert_eq!(request.line_items.len(), 2);
        assert_eq!(request.line_items[0].unit_amount_cents, 825);
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(request.line_items[1].product_name, "Shipping");
        assert_eq!(request.line_items[1].unit_amount_cents, 600);
        assert_eq!(request.urls.success_url, "http://localhost:5173/?success=true");
    }

    #[tokio::test]
    async fn test_free_shipping_at_threshold() {
        let app = app();
        let response = app.router.oneshot(checkout_request(&lemon_bars(3))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let request = app.gateway.last_request().await.unwrap();
        assert_eq!(request.line_items.len(), 1);
        assert_eq!(request.shipping_cents, 0);
    }

    #[tokio::test]
    async fn test_repeated_item_merged_into_one_line() {
        let app = app();
        let entry = json!({"id": "lemon-bar", "name": "Lemon Bar", "price": 8.25, "qty": 1});
        let body = json!({"items": [entry.clone(), entry]});
        let response = app.router.oneshot(checkout_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let request = app.gateway.last_request().await.unwrap();
        assert_eq!(request.line_items.len(), 2);
        assert_eq!(request.line_items[0].quantity, 2);
        assert_eq!(request.shipping_cents, 600);
    }

    #[tokio::test]
    async fn test_conflicting_item_rejected() {
        let app = app();
        let body = json!({"items": [
            {"id": "a", "name": "A", "price": 1.00, "qty": 1},
            {"id": "a", "name": "A", "price": 2.00, "qty": 1}
        ]});
        let response = app.router.oneshot(checkout_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Conflicting entries for item id: a"})
        );
        assert_eq!(app.gateway.calls().await, 0);
    }

    #[tokio::test]
    async fn test_empty_cart_never_reaches_provider() {
        for body in [json!({"items": []}), json!({}), json!({"items": "lemon-bar"})] {
            let app = app();
            let response = app.router.oneshot(checkout_request(&body)).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(body_json(response).await, json!({"error": "No items provided"}));
            assert_eq!(app.gateway.calls().await, 0);
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = app();
        let request = Request::builder()
            .method("POST")
            .uri("/create-checkout-session")
            .body(Body::from("{items:"))
            .unwrap();
        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
        assert_eq!(app.gateway.calls().await, 0);
    }

    #[tokio::test]
    async fn test_non_numeric_price_rejected() {
        let app = app();
        let body = json!({"items": [{"id": "a", "name": "A", "price": "free", "qty": 1}]});
        let response = app.router.oneshot(checkout_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(app.gateway.calls().await, 0);
    }

    #[tokio::test]
    async fn test_provider_failure_is_server_error() {
        let app = app_with(MockGateway::failing("Invalid API Key provided"), false);
        let response = app.router.oneshot(checkout_request(&lemon_bars(1))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unable to create checkout session");
        assert!(body["message"].as_str().unwrap().contains("Invalid API Key provided"));
        assert_eq!(app.gateway.calls().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_origin_rejected() {
        let app = app();
        let mut request = checkout_request(&lemon_bars(1));
        request
            .headers_mut()
            .insert(header::ORIGIN, "https://evil.example.com".parse().unwrap());
        let response = app.router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(app.gateway.calls().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_origin_preflight_rejected() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/create-checkout-session")
            .header(header::ORIGIN, "https://evil.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_allowed_origin_gets_cors_headers() {
        let mut request = checkout_request(&lemon_bars(1));
        request
            .headers_mut()
            .insert(header::ORIGIN, STOREFRONT.parse().unwrap());
        let response = app().router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            STOREFRONT
        );
    }

    fn completed_event() -> Vec<u8> {
        json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": {"object": {"id": "cs_test_1", "amount_total": 2250}}
        })
        .to_string()
        .into_bytes()
    }

    #[tokio::test]
    async fn test_signed_webhook_acknowledged() {
        let payload = completed_event();
        let signature =
            sign_payload(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();
        let response = app()
            .router
            .oneshot(webhook_request(&payload, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"received": true}));
    }

    #[tokio::test]
    async fn test_tampered_webhook_rejected() {
        let payload = completed_event();
        let signature =
            sign_payload(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), &payload).unwrap();
        let mut tampered = payload.clone();
        tampered.extend_from_slice(b"\n");

        let response = app()
            .router
            .oneshot(webhook_request(&tampered, Some(&signature)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("Webhook Error: "));
    }

    #[tokio::test]
    async fn test_unsigned_webhook_rejected() {
        let response = app()
            .router
            .oneshot(webhook_request(&completed_event(), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("Webhook Error: "));
    }

    #[tokio::test]
    async fn test_webhook_route_absent_when_disabled() {
        let app = app_with(MockGateway::new(), false);
        let response = app
            .router
            .oneshot(webhook_request(&completed_event(), Some("t=1,v1=00")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
