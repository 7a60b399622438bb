use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::Json;

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    pub user_id: String,
}

/// POST /api/accounts
///
/// Creates the account at the identity provider, then the local profile
/// row keyed by the returned user id.
pub async fn create_account(
    State(state): State<AppState>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<CreateAccountResponse>)> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::BadRequest("email and password are required".into()));
    }

    let identity = state
        .identity
        .as_ref()
        .ok_or_else(|| AppError::Internal("Identity service not configured".into()))?;

    let user_id = identity
        .create_account(request.email.trim(), &request.password)
        .await?;

    let conn = state.db.get()?;
    queries::ensure_profile(&conn, &user_id)?;

    tracing::info!(user_id = %user_id, "account created");

    Ok((StatusCode::CREATED, Json(CreateAccountResponse { user_id })))
}
