//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `PETALSHOP_API_URL` - Shop API base URL (default: `http://localhost:5139/api`)
//! - `PETALSHOP_SESSION_FILE` - Where the signed-in identity is kept
//!   (default: `.petalshop/session.json`)
//! - `PETALSHOP_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `PETALSHOP_CATALOG_CACHE_SECS` - Catalog cache TTL, 0 disables (default: 300)
//! - `PETALSHOP_NOTIFICATION_MS` - How long a notification stays up (default: 1500)
//! - `PETALSHOP_REDIRECT_MS` - Delay before navigating after an order or login (default: 1800)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:5139/api";
const DEFAULT_SESSION_FILE: &str = ".petalshop/session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL every API path is appended to (no trailing slash)
    pub api_url: String,
    /// File holding the persisted session identity
    pub session_file: PathBuf,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// TTL for cached catalog reads (zero disables caching)
    pub catalog_cache_ttl: Duration,
    /// How long a notification stays visible
    pub notification_ttl: Duration,
    /// Delay between a success message and the follow-up navigation
    pub redirect_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            http_timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
            notification_ttl: Duration::from_millis(1500),
            redirect_delay: Duration::from_millis(1800),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_url = match lookup("PETALSHOP_API_URL") {
            Some(raw) => parse_api_url("PETALSHOP_API_URL", &raw)?,
            None => defaults.api_url,
        };
        let session_file = lookup("PETALSHOP_SESSION_FILE")
            .map_or(defaults.session_file, PathBuf::from);

        let http_timeout = Duration::from_secs(parse_or(
            &lookup,
            "PETALSHOP_HTTP_TIMEOUT_SECS",
            defaults.http_timeout.as_secs(),
        )?);
        let catalog_cache_ttl = Duration::from_secs(parse_or(
            &lookup,
            "PETALSHOP_CATALOG_CACHE_SECS",
            defaults.catalog_cache_ttl.as_secs(),
        )?);
        let notification_ttl = Duration::from_millis(parse_or(
            &lookup,
            "PETALSHOP_NOTIFICATION_MS",
            1500,
        )?);
        let redirect_delay =
            Duration::from_millis(parse_or(&lookup, "PETALSHOP_REDIRECT_MS", 1800)?);

        if http_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "PETALSHOP_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            api_url,
            session_file,
            http_timeout,
            catalog_cache_ttl,
            notification_ttl,
            redirect_delay,
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Full URL for an API path such as `/cart/add`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and validate the API base URL, dropping any trailing slash.
fn parse_api_url(key: &str, raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Parse a variable if set, otherwise use the default.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
