pub mod queries;

use std::path::PathBuf;
use std::sync::Arc;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::Config;
use crate::email::EmailService;
use crate::error::Result;
use crate::identity::IdentityClient;
use crate::license::LicenseCodec;
use crate::payments::PolarClient;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Shared application state threaded through every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub codec: Arc<LicenseCodec>,
    pub identity: Option<IdentityClient>,
    pub polar: Option<PolarClient>,
    pub email: EmailService,
    pub base_url: String,
    pub downloads_dir: PathBuf,
    pub installer_name: String,
    pub dev_mode: bool,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let pool = init_pool(&config.database_path)?;

        let identity = match (&config.identity_url, &config.identity_service_key) {
            (Some(url), Some(key)) => Some(IdentityClient::new(url, key)),
            _ => None,
        };

        let polar = match (&config.polar_access_token, &config.polar_webhook_secret) {
            (Some(token), Some(secret)) => Some(PolarClient::new(
                &config.polar_api_url,
                token,
                secret,
                config.polar_trial_product_id.clone(),
                config.polar_lifetime_product_id.clone(),
            )),
            _ => None,
        };

        Ok(Self {
            db: pool,
            codec: Arc::new(LicenseCodec::new(config.license_secret.clone())),
            identity,
            polar,
            email: EmailService::new(),
            base_url: config.base_url.clone(),
            downloads_dir: PathBuf::from(&config.downloads_dir),
            installer_name: config.installer_name.clone(),
            dev_mode: config.dev_mode,
        })
    }
}

/// Opens the SQLite pool and ensures the schema exists.
pub fn init_pool(path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(path);
    let pool = r2d2::Pool::new(manager)?;
    let conn = pool.get()?;
    init_schema(&conn)?;
    Ok(pool)
}

/// Creates the two tables this service owns. Idempotent; no migration
/// tooling beyond this.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_profiles (
            id TEXT PRIMARY KEY,
            subscription_type TEXT NOT NULL DEFAULT 'none',
            trial_activated_at INTEGER,
            trial_ends_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS license_keys (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES user_profiles(id),
            license_key TEXT NOT NULL UNIQUE,
            key_type TEXT NOT NULL,
            device_id TEXT,
            expires_at INTEGER,
            is_activated INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_license_keys_user
            ON license_keys(user_id, key_type);",
    )
}
