use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::db::AppState;
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::payments::CheckoutKind;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: String,
    /// `trial` or `lifetime`; defaults to lifetime.
    #[serde(default)]
    pub license_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub checkout_id: String,
    pub success: bool,
}

/// POST /api/payments/checkout
///
/// Creates a Polar checkout session and returns the URL to redirect the
/// user to. License issuance happens later, when the webhook reports the
/// checkout as completed.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    if request.user_id.is_empty() {
        return Err(AppError::BadRequest("userId is required".into()));
    }

    let kind = match request.license_type.as_deref() {
        None => CheckoutKind::Lifetime,
        Some(s) => CheckoutKind::parse(s).ok_or_else(|| {
            AppError::BadRequest(
                "Invalid licenseType. Must be \"trial\" or \"lifetime\"".into(),
            )
        })?,
    };

    let polar = state
        .polar
        .as_ref()
        .ok_or_else(|| AppError::Internal("Payment service not configured".into()))?;

    let success_url = format!(
        "{}/dashboard?payment=success&userId={}&licenseType={}",
        state.base_url,
        request.user_id,
        kind.as_str()
    );
    let cancel_url = format!("{}/dashboard?payment=cancelled", state.base_url);

    let (checkout_id, checkout_url) = polar
        .create_checkout(kind, &request.user_id, &success_url, &cancel_url)
        .await?;

    tracing::info!(
        user_id = %request.user_id,
        kind = %kind.as_str(),
        checkout_id = %checkout_id,
        "checkout session created"
    );

    Ok(Json(CheckoutResponse {
        checkout_url,
        checkout_id,
        success: true,
    }))
}
