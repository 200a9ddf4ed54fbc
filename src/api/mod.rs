use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::clients::payments::{PaymentGateway, StripeGateway};
use crate::config::Config;
use crate::db::Store;
use crate::services::CheckoutService;

pub mod auth;
mod error;
mod products;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub checkout: Arc<CheckoutService>,

    pub config: Arc<Config>,
}

pub async fn create_app_state(
    config: Config,
    gateway: Arc<dyn PaymentGateway>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let checkout = Arc::new(CheckoutService::new(
        store.clone(),
        gateway,
        config.payments.currency.clone(),
    ));

    Ok(Arc::new(AppState {
        store,
        checkout,
        config: Arc::new(config),
    }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let gateway = Arc::new(StripeGateway::new(config.payments.clone()));
    create_app_state(config, gateway).await
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.server.session_expiry_minutes,
        )));

    // Product mutations are the only admin-gated part of the JSON surface.
    let admin_api = Router::new()
        .route("/products", post(products::create_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}", delete(products::delete_product))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let api_router = Router::new()
        .route("/products", get(products::list_products))
        .route("/products/{id}", get(products::get_product))
        .merge(admin_api);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .merge(crate::web::router(state.clone()))
        .layer(session_layer)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
