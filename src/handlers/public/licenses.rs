use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::{queries, AppState};
use crate::error::{AppError, Result};
use crate::extractors::{Json, Query};
use crate::handlers::{issuance, resolve_user};
use crate::license::{LicenseInfo, LicenseType};
use crate::models::LicenseRecord;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClaimTrialRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// POST /api/license/claim-trial
///
/// Issues the 7-day trial key for the authenticated user. Returns 409
/// with the existing key when the user already holds an active trial or a
/// lifetime license. The fresh key is echoed in the body only in dev mode;
/// otherwise it travels by email (stubbed) and the dashboard.
pub async fn claim_trial(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ClaimTrialRequest>,
) -> Result<Response> {
    let user = resolve_user(&state, &headers, request.user_id.as_deref()).await?;

    {
        let conn = state.db.get()?;
        queries::ensure_profile(&conn, &user.id)?;

        if queries::has_active_license(&conn, &user.id, Some(LicenseType::Trial))? {
            let existing = queries::latest_license(&conn, &user.id, Some(LicenseType::Trial))?;
            return Ok(conflict_response(
                "You already have an active trial license.",
                existing,
            ));
        }

        if queries::has_active_license(&conn, &user.id, Some(LicenseType::Lifetime))? {
            let existing = queries::latest_license(&conn, &user.id, Some(LicenseType::Lifetime))?;
            return Ok(conflict_response(
                "You already have a lifetime license. Cannot claim trial.",
                existing,
            ));
        }
    }

    let record = issuance::issue_trial(&state, &user)?;

    let mut body = json!({
        "success": true,
        "message": format!(
            "Success! Check your email ({}) for your trial license key.",
            user.email
        ),
    });
    if state.dev_mode {
        body["licenseKey"] = json!(record.license_key);
    }

    Ok((StatusCode::CREATED, axum::Json(body)).into_response())
}

fn conflict_response(message: &str, existing: Option<LicenseRecord>) -> Response {
    let mut body = json!({ "success": false, "error": message });
    if let Some(license) = existing {
        body["existing"] = json!({
            "licenseKey": license.license_key,
            "type": license.key_type,
            "createdAt": license.created_at,
            "expiresAt": license.expires_at,
            "isActivated": license.is_activated,
        });
    }
    (StatusCode::CONFLICT, axum::Json(body)).into_response()
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LicenseQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LicenseStatusResponse {
    pub subscription_type: String,
    pub license: LicenseRecord,
    /// What the key itself encodes, recovered by the codec.
    pub info: LicenseInfo,
}

/// GET /api/license
///
/// Dashboard view: the user's most recent license record together with
/// the codec's reading of the key. Accepts either a Bearer session token
/// or a `userId` query parameter.
pub async fn get_license(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<LicenseQuery>,
) -> Result<Json<LicenseStatusResponse>> {
    let user = resolve_user(&state, &headers, query.user_id.as_deref()).await?;

    let conn = state.db.get()?;
    let profile = queries::get_profile(&conn, &user.id)?
        .ok_or_else(|| AppError::NotFound("No profile for this user".into()))?;

    let license = queries::latest_license(&conn, &user.id, None)?
        .ok_or_else(|| AppError::NotFound("No license key found".into()))?;

    let info = state
        .codec
        .validate(&license.license_key)
        .map_err(|e| AppError::Internal(format!("stored key failed validation: {e}")))?;

    Ok(Json(LicenseStatusResponse {
        subscription_type: profile.subscription_type,
        license,
        info,
    }))
}
