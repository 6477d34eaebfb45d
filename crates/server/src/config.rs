//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GACHADEX_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `GACHADEX_HOST` - Bind address (default: 127.0.0.1)
//! - `GACHADEX_PORT` - Listen port (default: 3000)
//! - `GACHADEX_BASE_URL` - Public URL, decides the `Secure` cookie flag (default: <http://localhost:3000>)
//! - `GACHADEX_CATALOG_PATH` - Catalog JSON file (default: crates/server/data/catalog.json)
//! - `GACHADEX_DRAW_COST` - Pokéballs spent per draw (default: 1)
//! - `GACHADEX_STARTING_CREDITS` - Pokéballs granted on registration (default: 5)
//! - `GACHADEX_CODE_CLEANUP_INTERVAL_SECS` - Expired code sweep interval, 0 disables (default: 300)
//! - `SMTP_HOST` - Enables SMTP delivery; when set, `SMTP_USERNAME`, `SMTP_PASSWORD`
//!   and `SMTP_FROM` become required
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Gachadex server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Catalog JSON file loaded at startup
    pub catalog_path: PathBuf,
    /// Draw economy settings
    pub game: GameConfig,
    /// Expired one-time code sweep interval; `None` disables the task
    pub code_cleanup_interval: Option<Duration>,
    /// SMTP delivery; `None` logs codes instead of sending them
    pub smtp: Option<SmtpConfig>,
    /// Key rate limits on proxy headers (`CF-Connecting-IP`, `X-Forwarded-For`)
    /// instead of the socket peer. Only safe behind a proxy that sets them.
    pub trust_proxy_headers: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Draw economy settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Pokéballs spent per draw
    pub draw_cost: u32,
    /// Pokéballs a new account starts with
    pub starting_credits: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            draw_cost: 1,
            starting_credits: 5,
        }
    }
}

/// SMTP relay settings.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// Sender mailbox, e.g. `Gachadex <no-reply@gachadex.dev>`
    pub from: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GACHADEX_DATABASE_URL")?;
        let host: IpAddr = get_parsed_or_default("GACHADEX_HOST", "127.0.0.1")?;
        let port: u16 = get_parsed_or_default("GACHADEX_PORT", "3000")?;
        let base_url = get_env_or_default("GACHADEX_BASE_URL", "http://localhost:3000");
        let catalog_path = PathBuf::from(get_env_or_default(
            "GACHADEX_CATALOG_PATH",
            "crates/server/data/catalog.json",
        ));

        let game = GameConfig::from_env()?;

        let cleanup_secs: u64 = get_parsed_or_default("GACHADEX_CODE_CLEANUP_INTERVAL_SECS", "300")?;
        let code_cleanup_interval = (cleanup_secs > 0).then(|| Duration::from_secs(cleanup_secs));

        let smtp = SmtpConfig::from_env()?;
        let trust_proxy_headers: bool =
            get_parsed_or_default("GACHADEX_TRUST_PROXY_HEADERS", "false")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            catalog_path,
            game,
            code_cleanup_interval,
            smtp,
            trust_proxy_headers,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl GameConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let draw_cost: u32 = get_parsed_or_default("GACHADEX_DRAW_COST", "1")?;
        if draw_cost == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "GACHADEX_DRAW_COST".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            draw_cost,
            starting_credits: get_parsed_or_default("GACHADEX_STARTING_CREDITS", "5")?,
        })
    }
}

impl SmtpConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };
        Ok(Some(Self {
            host,
            port: get_parsed_or_default("SMTP_PORT", "587")?,
            username: get_required_env("SMTP_USERNAME")?,
            password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from: get_required_env("SMTP_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn get_parsed_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
