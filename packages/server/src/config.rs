use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Issued tokens and session rows expire this many hours after login.
    pub token_ttl_hours: i64,
    /// Email seeded into the sign-up allow list at startup, with the `super`
    /// role, so a fresh deployment has a way in.
    pub bootstrap_email: Option<String>,
}

/// Object storage settings.
///
/// `backend` selects the implementation: `s3` for the real bucket, `memory`
/// for the in-process store used in local development.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: String,
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub public_base_url: String,
    pub timeout_secs: u64,
    /// Largest accepted upload, in bytes.
    pub max_upload_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSweepConfig {
    /// Seconds between sweeps of expired/revoked session rows.
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub session_sweep: SessionSweepConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("storage.backend", "s3")?
            .set_default("storage.bucket", "")?
            .set_default("storage.region", "")?
            .set_default("storage.endpoint", "")?
            .set_default("storage.access_key", "")?
            .set_default("storage.secret_key", "")?
            .set_default("storage.public_base_url", "")?
            .set_default("storage.timeout_secs", 30)?
            .set_default("storage.max_upload_size", 16 * 1024 * 1024)?
            .set_default("session_sweep.interval_secs", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., APEX__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("APEX").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
