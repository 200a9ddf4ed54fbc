use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tower_sessions::Session;

use crate::api::{AppState, auth::current_user};
use crate::db::User;

mod admin;
mod auth;
mod cart;
mod catalog;
mod checkout;

/// HTML error: anything unexpected becomes a plain 500. User-visible
/// failures travel as flash messages instead.
pub struct WebError(anyhow::Error);

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        tracing::error!("Page handler failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

impl<E> From<E> for WebError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

const FLASH_KEY: &str = "flashes";

/// Queue a one-shot message for the next rendered page.
pub async fn flash(session: &Session, message: impl Into<String>) {
    let mut messages: Vec<String> = session.get(FLASH_KEY).await.ok().flatten().unwrap_or_default();
    messages.push(message.into());
    if let Err(e) = session.insert(FLASH_KEY, &messages).await {
        tracing::warn!("Failed to store flash message: {e}");
    }
}

/// Drain queued flash messages.
pub async fn take_flashes(session: &Session) -> Vec<String> {
    session
        .remove::<Vec<String>>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Per-request data every page template renders: nav state and flashes.
pub struct PageContext {
    pub username: Option<String>,
    pub is_admin: bool,
    pub flashes: Vec<String>,
}

impl PageContext {
    pub async fn build(state: &Arc<AppState>, session: &Session) -> Self {
        let user = current_user(state, session).await.ok().flatten();
        Self {
            username: user.as_ref().map(|u| u.username.clone()),
            is_admin: user.as_ref().is_some_and(User::is_admin),
            flashes: take_flashes(session).await,
        }
    }
}

/// Guard for pages that need a logged-in user. Redirects anonymous
/// visitors to the login form.
async fn require_login(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match current_user(&state, &session).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => {
            flash(&session, "Please log in to continue.").await;
            Redirect::to("/login").into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Guard for admin pages. Anyone without admin rights, logged in or not,
/// goes to the login form.
async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    match current_user(&state, &session).await {
        Ok(Some(user)) if user.is_admin() => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(Some(user)) => {
            tracing::warn!("User {} denied admin page access", user.username);
            flash(&session, "Admin access required.").await;
            Redirect::to("/login").into_response()
        }
        Ok(None) => {
            flash(&session, "Please log in to continue.").await;
            Redirect::to("/login").into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let customer_routes = Router::new()
        .route("/cart", get(cart::view_cart))
        .route("/add_to_cart/{id}", get(cart::add_to_cart))
        .route("/remove_from_cart/{id}", post(cart::remove_from_cart))
        .route(
            "/checkout",
            get(checkout::checkout_page).post(checkout::submit_checkout),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_login,
        ));

    let admin_routes = Router::new()
        .route("/admin_products", get(admin::product_list))
        .route(
            "/add_product",
            get(admin::add_product_page).post(admin::add_product),
        )
        .route(
            "/admin/product/edit/{id}",
            get(admin::edit_product_page).post(admin::edit_product),
        )
        .route("/admin/product/delete/{id}", post(admin::delete_product))
        .route_layer(middleware::from_fn_with_state(state, require_admin));

    Router::new()
        .route("/", get(catalog::home))
        .route("/product/{id}", get(catalog::product_detail))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", get(auth::logout))
        .merge(customer_routes)
        .merge(admin_routes)
}
