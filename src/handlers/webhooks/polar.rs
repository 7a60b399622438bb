use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::db::AppState;
use crate::handlers::issuance;
use crate::payments::{CheckoutKind, PolarWebhookEvent};

/// POST /api/payments/webhook
///
/// Polar delivers checkout lifecycle events here, signed with an
/// HMAC-SHA256 over the raw body. Signature failures are rejected with
/// 401; once the signature checks out, the handler acknowledges receipt
/// even when processing fails (202/200 with an error body) so the
/// provider does not retry-storm us. Failed issuances are logged for
/// manual review.
pub async fn handle_polar_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = match headers.get("x-polar-signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s.to_string(),
        None => {
            tracing::warn!("webhook received without signature");
            return error_response(StatusCode::UNAUTHORIZED, "Missing signature");
        }
    };

    let Some(polar) = state.polar.as_ref() else {
        tracing::error!("POLAR_WEBHOOK_SECRET not configured");
        return error_response(StatusCode::UNAUTHORIZED, "Webhook not configured");
    };

    match polar.verify_webhook_signature(&body, &signature) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("webhook signature verification failed");
            return error_response(StatusCode::UNAUTHORIZED, "Invalid signature");
        }
        Err(e) => {
            tracing::error!(error = %e, "signature verification error");
            return error_response(StatusCode::UNAUTHORIZED, "Invalid signature");
        }
    }

    let event: PolarWebhookEvent = match serde_json::from_slice(&body) {
        Ok(e) => e,
        Err(e) => {
            // Acknowledge unparseable-but-authentic payloads; retrying
            // the same bytes cannot succeed.
            tracing::error!(error = %e, "failed to parse webhook body");
            return acknowledged(StatusCode::OK, Some("Webhook processing failed"));
        }
    };

    tracing::info!(event_type = %event.event_type, "processing Polar webhook event");

    match event.event_type.as_str() {
        "checkout.completed" => handle_checkout_completed(&state, event).await,
        "checkout.expired" => {
            tracing::info!(checkout_id = %event.data.id, "checkout expired");
            acknowledged(StatusCode::OK, None)
        }
        _ => acknowledged(StatusCode::OK, None),
    }
}

async fn handle_checkout_completed(state: &AppState, event: PolarWebhookEvent) -> Response {
    let checkout = event.data;

    let Some(user_id) = checkout.metadata.user_id.as_deref() else {
        tracing::error!(checkout_id = %checkout.id, "checkout completed but userId missing in metadata");
        return (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({ "error": "Missing userId in metadata", "received": true })),
        )
            .into_response();
    };

    let kind = checkout
        .metadata
        .license_type
        .as_deref()
        .and_then(CheckoutKind::parse)
        .unwrap_or(CheckoutKind::Lifetime);

    tracing::info!(
        user_id = %user_id,
        kind = %kind.as_str(),
        checkout_id = %checkout.id,
        "processing payment"
    );

    match issue_for_checkout(state, user_id, kind).await {
        Ok(key) => {
            tracing::info!(user_id = %user_id, key = %key, "license issued for completed checkout");
            acknowledged(StatusCode::OK, None)
        }
        Err(e) => {
            // Acknowledge but flag for manual review.
            tracing::error!(user_id = %user_id, error = %e, "license issuance failed after payment");
            acknowledged(
                StatusCode::ACCEPTED,
                Some("License generation failed but webhook acknowledged"),
            )
        }
    }
}

async fn issue_for_checkout(
    state: &AppState,
    user_id: &str,
    kind: CheckoutKind,
) -> crate::error::Result<String> {
    let identity = state.identity.as_ref().ok_or_else(|| {
        crate::error::AppError::Internal("Identity service not configured".into())
    })?;
    let user = identity.get_user_by_id(user_id).await?;

    let record = match kind {
        CheckoutKind::Trial => issuance::issue_trial(state, &user)?,
        CheckoutKind::Lifetime => issuance::issue_lifetime(state, &user)?,
    };
    Ok(record.license_key)
}

fn acknowledged(status: StatusCode, error: Option<&str>) -> Response {
    let body = match error {
        Some(e) => json!({ "error": e, "received": true }),
        None => json!({ "received": true }),
    };
    (status, axum::Json(body)).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(json!({ "error": message }))).into_response()
}
