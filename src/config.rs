use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    /// Public base URL, used for payment success/cancel redirects.
    pub base_url: String,
    /// Secret salt mixed into every license key hash. Rotating it
    /// invalidates all previously issued keys.
    pub license_secret: String,
    /// Identity provider admin API.
    pub identity_url: Option<String>,
    pub identity_service_key: Option<String>,
    /// Polar payment processor.
    pub polar_api_url: String,
    pub polar_access_token: Option<String>,
    pub polar_trial_product_id: Option<String>,
    pub polar_lifetime_product_id: Option<String>,
    pub polar_webhook_secret: Option<String>,
    /// Directory holding the installer binary served by /api/download.
    pub downloads_dir: String,
    pub installer_name: String,
    pub dev_mode: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("VIBERYT_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let license_secret = env::var("LICENSE_KEY_SECRET").unwrap_or_else(|_| {
            tracing::warn!("LICENSE_KEY_SECRET not set, using built-in development salt");
            "VibeRyt2025SecretSalt".to_string()
        });

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "viberyt.db".to_string()),
            base_url,
            license_secret,
            identity_url: env::var("IDENTITY_URL").ok(),
            identity_service_key: env::var("IDENTITY_SERVICE_KEY").ok(),
            polar_api_url: env::var("POLAR_API_URL")
                .unwrap_or_else(|_| "https://api.polar.sh".to_string()),
            polar_access_token: env::var("POLAR_ACCESS_TOKEN").ok(),
            polar_trial_product_id: env::var("POLAR_TRIAL_PRODUCT_ID").ok(),
            polar_lifetime_product_id: env::var("POLAR_LIFETIME_PRODUCT_ID").ok(),
            polar_webhook_secret: env::var("POLAR_WEBHOOK_SECRET").ok(),
            downloads_dir: env::var("DOWNLOADS_DIR").unwrap_or_else(|_| "downloads".to_string()),
            installer_name: env::var("INSTALLER_NAME")
                .unwrap_or_else(|_| "VibeRyt.exe".to_string()),
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
