use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// The two purchasable checkout flavors. Demo keys are never sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutKind {
    Trial,
    Lifetime,
}

impl CheckoutKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(Self::Trial),
            "lifetime" => Some(Self::Lifetime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trial => "trial",
            Self::Lifetime => "lifetime",
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateCheckoutRequest<'a> {
    product_id: &'a str,
    success_url: &'a str,
    cancel_url: &'a str,
    customer_email_optional: bool,
    metadata: CheckoutMetadata,
}

/// Metadata round-tripped through Polar: set on checkout creation, handed
/// back in the webhook event. Field names are part of the wire contract.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutMetadata {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub license_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateCheckoutResponse {
    id: String,
    checkout_url: String,
}

/// Webhook event envelope delivered by Polar.
#[derive(Debug, Deserialize)]
pub struct PolarWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PolarCheckoutData,
}

#[derive(Debug, Deserialize)]
pub struct PolarCheckoutData {
    pub id: String,
    #[serde(default)]
    pub metadata: CheckoutMetadata,
}

#[derive(Debug, Clone)]
pub struct PolarClient {
    client: Client,
    api_base: String,
    access_token: String,
    webhook_secret: String,
    trial_product_id: Option<String>,
    lifetime_product_id: Option<String>,
}

impl PolarClient {
    pub fn new(
        api_base: &str,
        access_token: &str,
        webhook_secret: &str,
        trial_product_id: Option<String>,
        lifetime_product_id: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            webhook_secret: webhook_secret.to_string(),
            trial_product_id,
            lifetime_product_id,
        }
    }

    fn product_id(&self, kind: CheckoutKind) -> Result<&str> {
        let id = match kind {
            CheckoutKind::Trial => self.trial_product_id.as_deref(),
            CheckoutKind::Lifetime => self.lifetime_product_id.as_deref(),
        };
        id.ok_or_else(|| {
            AppError::Internal(format!("No Polar product configured for {}", kind.as_str()))
        })
    }

    /// Creates a hosted checkout session, returning `(checkout_id, url)`.
    /// The user id travels in the metadata and comes back via the webhook.
    pub async fn create_checkout(
        &self,
        kind: CheckoutKind,
        user_id: &str,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<(String, String)> {
        let request = CreateCheckoutRequest {
            product_id: self.product_id(kind)?,
            success_url,
            cancel_url,
            customer_email_optional: false,
            metadata: CheckoutMetadata {
                user_id: Some(user_id.to_string()),
                license_type: Some(kind.as_str().to_string()),
                timestamp: Some(Utc::now().to_rfc3339()),
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/checkouts", self.api_base))
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Polar API error: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "Polar checkout creation failed");
            return Err(AppError::Upstream(
                "Failed to create checkout with payment provider".into(),
            ));
        }

        let checkout: CreateCheckoutResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Polar response: {e}")))?;

        Ok((checkout.id, checkout.checkout_url))
    }

    /// Verifies the webhook HMAC: SHA-256 over the raw body with the
    /// shared secret, hex-encoded, compared in constant time.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> Result<bool> {
        let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| AppError::Internal("Invalid webhook secret".into()))?;
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        Ok(expected.as_bytes().ct_eq(signature.as_bytes()).into())
    }
}
