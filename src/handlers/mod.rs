pub mod issuance;
pub mod public;
pub mod webhooks;

use axum::http::HeaderMap;
use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::identity::AuthUser;
use crate::util::extract_bearer_token;

/// Resolves the caller to an identity-provider user: Bearer session token
/// first, then an explicit user id verified via the admin API.
pub(crate) async fn resolve_user(
    state: &AppState,
    headers: &HeaderMap,
    user_id: Option<&str>,
) -> Result<AuthUser> {
    let identity = state
        .identity
        .as_ref()
        .ok_or_else(|| AppError::Internal("Identity service not configured".into()))?;

    if let Some(token) = extract_bearer_token(headers) {
        return identity.verify_token(token).await;
    }

    if let Some(id) = user_id {
        return identity.get_user_by_id(id).await;
    }

    Err(AppError::Unauthorized(
        "No authentication provided (userId or Authorization header required)".into(),
    ))
}

/// Full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(public::router())
        .merge(webhooks::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
