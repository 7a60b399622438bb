//! Shared test helpers: state builders, mock collaborators, request glue.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use hmac::{Hmac, Mac};
use r2d2_sqlite::SqliteConnectionManager;
use sha2::Sha256;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use viberyt::db::{init_schema, AppState, DbPool};
use viberyt::email::EmailService;
use viberyt::handlers;
use viberyt::identity::IdentityClient;
use viberyt::license::LicenseCodec;
use viberyt::payments::PolarClient;

pub const TEST_SECRET: &str = "test-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const SERVICE_KEY: &str = "service-role-key";

/// Test state plus the tempdir backing its SQLite file.
pub struct TestContext {
    pub state: AppState,
    pub tmp: TempDir,
}

pub fn test_pool(tmp: &TempDir) -> DbPool {
    let manager = SqliteConnectionManager::file(tmp.path().join("test.db"));
    let pool = r2d2::Pool::new(manager).unwrap();
    init_schema(&pool.get().unwrap()).unwrap();
    pool
}

/// State with no external collaborators configured.
pub fn create_test_context() -> TestContext {
    create_test_context_with(None, None)
}

/// State pointing identity/Polar clients at mock servers.
pub fn create_test_context_with(
    identity_url: Option<&str>,
    polar_url: Option<&str>,
) -> TestContext {
    let tmp = TempDir::new().unwrap();
    let state = AppState {
        db: test_pool(&tmp),
        codec: Arc::new(LicenseCodec::new(TEST_SECRET)),
        identity: identity_url.map(|u| IdentityClient::new(u, SERVICE_KEY)),
        polar: polar_url.map(|u| {
            PolarClient::new(
                u,
                "polar-test-token",
                WEBHOOK_SECRET,
                Some("prod_trial".to_string()),
                Some("prod_lifetime".to_string()),
            )
        }),
        email: EmailService::new(),
        base_url: "http://localhost:3000".to_string(),
        downloads_dir: tmp.path().join("downloads"),
        installer_name: "VibeRyt.exe".to_string(),
        dev_mode: true,
    };
    TestContext { state, tmp }
}

pub fn app(state: AppState) -> Router {
    handlers::router(state)
}

/// Stubs the identity admin lookup for one user.
pub async fn mount_user(server: &MockServer, user_id: &str, email: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/auth/v1/admin/users/{user_id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": user_id, "email": email })),
        )
        .mount(server)
        .await;
}

/// Stubs session-token verification for one token.
pub async fn mount_token(server: &MockServer, token: &str, user_id: &str, email: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("Authorization", format!("Bearer {token}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": user_id, "email": email })),
        )
        .mount(server)
        .await;
}

/// Stubs the Polar checkout-creation endpoint.
pub async fn mount_polar_checkout(server: &MockServer, checkout_id: &str, url: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/checkouts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "id": checkout_id, "checkout_url": url }),
        ))
        .mount(server)
        .await;
}

/// Signs a webhook body the way Polar does: HMAC-SHA256, hex digest.
pub fn sign_webhook(body: &[u8]) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).expect("hmac key");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
