use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, AppState};
use crate::db::User;

/// Session key holding the logged-in user's id.
pub const SESSION_USER_KEY: &str = "user_id";

/// Resolve the logged-in user from the session, if any. A stale session
/// pointing at a deleted user resolves to `None`.
pub async fn current_user(
    state: &Arc<AppState>,
    session: &Session,
) -> Result<Option<User>, ApiError> {
    let user_id: Option<i32> = session
        .get(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?;

    let Some(user_id) = user_id else {
        return Ok(None);
    };

    state
        .store
        .get_user_by_id(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))
}

/// Guard for admin-only JSON routes. Rejects with a 403 JSON body whether
/// the caller is anonymous or merely non-admin, and stashes the resolved
/// user in request extensions for the handler.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(user) = current_user(&state, &session).await? else {
        return Err(ApiError::admin_required());
    };

    if !user.is_admin() {
        tracing::warn!("User {} denied admin API access", user.username);
        return Err(ApiError::admin_required());
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
