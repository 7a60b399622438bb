use serde::{Deserialize, Serialize};

use crate::license::LicenseType;

/// Row in `user_profiles`. One per identity-provider user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    /// `none`, `trial` or `lifetime`.
    pub subscription_type: String,
    pub trial_activated_at: Option<i64>,
    pub trial_ends_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Row in `license_keys`. Associates an issued key string with a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub id: String,
    pub user_id: String,
    pub license_key: String,
    /// `trial`, `lifetime` or `demo`.
    pub key_type: String,
    /// Reserved for device binding; nothing enforces it yet.
    pub device_id: Option<String>,
    pub expires_at: Option<i64>,
    pub is_activated: bool,
    pub created_at: i64,
}

/// Parameters for storing a freshly generated key.
#[derive(Debug, Clone)]
pub struct StoreLicenseKey {
    pub user_id: String,
    pub license_key: String,
    pub key_type: LicenseType,
    /// Days until expiry; ignored for lifetime keys.
    pub days_valid: Option<i64>,
    pub device_id: Option<String>,
}

impl LicenseType {
    /// Lowercase name stored in the `key_type` column.
    #[must_use]
    pub fn record_name(&self) -> &'static str {
        match self {
            LicenseType::Trial => "trial",
            LicenseType::Lifetime => "lifetime",
            LicenseType::Demo => "demo",
        }
    }
}
