mod accounts;
mod checkout;
mod download;
mod licenses;

pub use accounts::*;
pub use checkout::*;
pub use download::*;
pub use licenses::*;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/accounts", post(create_account))
        .route("/api/license", get(get_license))
        .route("/api/license/claim-trial", post(claim_trial))
        .route("/api/payments/checkout", post(create_checkout))
        .route("/api/download", get(download_installer))
}
