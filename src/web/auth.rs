use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::info;

use super::{PageContext, WebError, flash};
use crate::api::{AppState, auth::SESSION_USER_KEY};
use crate::entities::users::UserRole;

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
}

#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub page: PageContext,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    pub username: String,
    pub password: String,
}

pub async fn login_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> LoginTemplate {
    LoginTemplate {
        page: PageContext::build(&state, &session).await,
    }
}

/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, WebError> {
    let user = state
        .store
        .verify_user_password(&form.username, &form.password)
        .await?;

    let Some(user) = user else {
        flash(&session, "Invalid username or password.").await;
        return Ok(Redirect::to("/login"));
    };

    // New session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|e| anyhow::anyhow!("Session error: {e}"))?;
    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| anyhow::anyhow!("Session error: {e}"))?;

    info!("User {} logged in", user.username);
    flash(&session, "Logged in successfully.").await;
    Ok(Redirect::to("/"))
}

pub async fn register_page(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> RegisterTemplate {
    RegisterTemplate {
        page: PageContext::build(&state, &session).await,
    }
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect, WebError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        flash(&session, "Username and password are required.").await;
        return Ok(Redirect::to("/register"));
    }

    if state.store.get_user_by_username(username).await?.is_some() {
        flash(&session, "Username already exists.").await;
        return Ok(Redirect::to("/register"));
    }

    let user = state
        .store
        .create_user(
            username,
            &form.password,
            UserRole::Customer,
            &state.config.security,
        )
        .await?;

    info!("Registered new user {}", user.username);
    flash(&session, "Registration successful. Please log in.").await;
    Ok(Redirect::to("/login"))
}

/// GET /logout
pub async fn logout(session: Session) -> Redirect {
    let _ = session.remove::<i32>(SESSION_USER_KEY).await;
    flash(&session, "Logged out.").await;
    Redirect::to("/")
}
