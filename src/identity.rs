//! Client for the hosted identity provider.
//!
//! Accounts, passwords and sessions live entirely in the provider; this
//! service only ever asks it three questions: who does this session token
//! belong to, does this user id exist, and "create an account". Profile
//! and license rows are keyed by the provider's user id.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A user as reported by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl IdentityClient {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// Resolves a session token to the user it belongs to.
    pub async fn verify_token(&self, token: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("Authorization", format!("Bearer {}", token))
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("identity provider: {e}")))?;

        match response.status() {
            StatusCode::OK => response
                .json::<AuthUser>()
                .await
                .map_err(|e| AppError::Upstream(format!("identity provider response: {e}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AppError::Unauthorized("Invalid or expired token".into()))
            }
            status => Err(AppError::Upstream(format!(
                "identity provider returned {status}"
            ))),
        }
    }

    /// Looks a user up by id via the admin API.
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(format!("{}/auth/v1/admin/users/{}", self.base_url, user_id))
            .header("Authorization", format!("Bearer {}", self.service_key))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("identity provider: {e}")))?;

        match response.status() {
            StatusCode::OK => response
                .json::<AuthUser>()
                .await
                .map_err(|e| AppError::Upstream(format!("identity provider response: {e}"))),
            StatusCode::NOT_FOUND => Err(AppError::NotFound(
                "User not found. Please ensure you are signed in.".into(),
            )),
            status => Err(AppError::Upstream(format!(
                "identity provider returned {status}"
            ))),
        }
    }

    /// Creates an account, returning the new user id.
    pub async fn create_account(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/auth/v1/admin/users", self.base_url))
            .header("Authorization", format!("Bearer {}", self.service_key))
            .json(&CreateAccountRequest { email, password })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("identity provider: {e}")))?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED => {
                let user: AuthUser = response
                    .json()
                    .await
                    .map_err(|e| AppError::Upstream(format!("identity provider response: {e}")))?;
                Ok(user.id)
            }
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Err(AppError::Conflict(
                "An account with this email already exists".into(),
            )),
            status => Err(AppError::Upstream(format!(
                "identity provider returned {status}"
            ))),
        }
    }
}
