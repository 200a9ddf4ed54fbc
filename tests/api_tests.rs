use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use shopfront::api::AppState;
use shopfront::clients::payments::{Charge, ChargeRequest, PaymentError, PaymentGateway};
use shopfront::config::Config;

/// Gateway stand-in for tests that never reach checkout.
struct NoopGateway;

#[async_trait::async_trait]
impl PaymentGateway for NoopGateway {
    async fn charge(&self, _request: ChargeRequest) -> Result<Charge, PaymentError> {
        Err(PaymentError::Processing("not wired in this test".to_string()))
    }
}

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = shopfront::api::create_app_state(config, Arc::new(NoopGateway))
        .await
        .expect("Failed to create app state");

    (shopfront::api::router(state.clone()), state)
}

/// Log in through the HTML form and return the session cookie.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from(format!(
                    "username={username}&password={password}"
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/");

    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should start a session")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn register(app: &Router, username: &str, password: &str) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from(format!(
                    "username={username}&password={password}"
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_product_listing_starts_empty() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["products"], serde_json::json!([]));
}

#[tokio::test]
async fn test_get_unknown_product_is_404() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/products/42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Product not found");
}

#[tokio::test]
async fn test_admin_product_crud() {
    let (app, _state) = spawn_app().await;
    let cookie = login(&app, "admin", "admin").await;

    // Create
    let payload = serde_json::json!({
        "name": "Widget",
        "price": 19.99,
        "inventory": 5,
        "category": "Tools",
        "image_url": "https://example.com/widget.png"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/products")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Product added");
    let id = json["id"].as_i64().unwrap();

    // Fields come back exactly as stored
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/products/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], "Widget");
    assert_eq!(json["price"], 19.99);
    assert_eq!(json["inventory"], 5);
    assert_eq!(json["category"], "Tools");
    assert_eq!(json["image_url"], "https://example.com/widget.png");

    // Partial update leaves the other fields alone
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/products/{id}"))
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"price": 24.50}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Product updated");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/products/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["price"], 24.50);
    assert_eq!(json["name"], "Widget");
    assert_eq!(json["inventory"], 5);

    // Delete
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/products/{id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Product deleted");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/products/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mutations_rejected_without_admin() {
    let (app, state) = spawn_app().await;

    let payload = serde_json::json!({
        "name": "Widget",
        "price": 9.99,
        "inventory": 3
    });

    // Anonymous
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/products")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Admin access required");

    // Logged-in customer
    register(&app, "carol", "hunter2").await;
    let cookie = login(&app, "carol", "hunter2").await;

    for (method, uri) in [
        ("POST", "/api/products".to_string()),
        ("PUT", "/api/products/1".to_string()),
        ("DELETE", "/api/products/1".to_string()),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(&uri)
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{method} {uri}");
    }

    // Nothing slipped through
    let products = state.store.list_products().await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_create_product_validation() {
    let (app, _state) = spawn_app().await;
    let cookie = login(&app, "admin", "admin").await;

    let post = |body: serde_json::Value| {
        let app = app.clone();
        let cookie = cookie.clone();
        async move {
            app.oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header(header::COOKIE, &cookie)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let response = post(serde_json::json!({"name": "NoPrice"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Missing required fields");

    let response = post(serde_json::json!({
        "name": "BadPrice",
        "price": "not-a-number",
        "inventory": 3
    }))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid price or inventory");

    // Numeric strings are accepted
    let response = post(serde_json::json!({
        "name": "StringPrice",
        "price": "12.50",
        "inventory": "7"
    }))
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from("username=admin&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Back to the login form instead of a session
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_register_rejects_duplicate_username() {
    let (app, _state) = spawn_app().await;

    register(&app, "dave", "secret").await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                )
                .body(Body::from("username=dave&password=other"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/register"
    );
}

#[tokio::test]
async fn test_cart_requires_login() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/cart")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
}

#[tokio::test]
async fn test_admin_pages_redirect_non_admins_to_login() {
    let (app, _state) = spawn_app().await;

    // Anonymous
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin_products")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");

    // Logged-in customer lands on the same login redirect
    register(&app, "erin", "secret").await;
    let cookie = login(&app, "erin", "secret").await;

    for uri in ["/admin_products", "/add_product", "/admin/product/edit/1"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login",
            "{uri}"
        );
    }
}
