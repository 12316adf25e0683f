//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FITWEAR_API_BASE_URL` - REST API root (default: `http://localhost:5000/api`)
//! - `FITWEAR_STATE_DIR` - Directory for durable session/cart state (default: `.fitwear`)
//! - `FITWEAR_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `FITWEAR_PRODUCT_CACHE_TTL_SECS` - Product lookup cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_STATE_DIR: &str = ".fitwear";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// FitWear client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API root. Always ends in `/` so endpoint paths join beneath it.
    pub api_base_url: Url,
    /// Directory holding the durable session and cart entries
    pub state_dir: PathBuf,
    /// Timeout applied to every API request
    pub request_timeout: Duration,
    /// How long product lookups stay cached in-process
    pub product_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production", "staging")
    pub sentry_environment: Option<String>,
}

impl ClientConfig {
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

        let api_base_url = parse_base_url(
            "FITWEAR_API_BASE_URL",
            &get_env_or_default("FITWEAR_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let state_dir = PathBuf::from(get_env_or_default("FITWEAR_STATE_DIR", DEFAULT_STATE_DIR));
        let request_timeout = get_duration_secs(
            "FITWEAR_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "FITWEAR_REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let product_cache_ttl = get_duration_secs(
            "FITWEAR_PRODUCT_CACHE_TTL_SECS",
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?;

        Ok(Self {
            api_base_url,
            state_dir,
            request_timeout,
            product_cache_ttl,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_base_url` with every other setting at
    /// its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not http(s).
    pub fn with_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", api_base_url)?,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Read a whole number of seconds.
fn get_duration_secs(key: &str, default: u64) -> Result<Duration, ConfigError> {
    get_optional_env(key).map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse and normalize the API root so relative endpoint paths join beneath it.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let url = parse_base_url("TEST", "http://localhost:5000/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/");
        assert_eq!(
            url.join("auth/login").unwrap().as_str(),
            "http://localhost:5000/api/auth/login"
        );
    }

    #[test]
    fn test_base_url_drops_query_and_fragment() {
        let url = parse_base_url("TEST", "https://shop.test/api/?x=1#top").unwrap();
        assert_eq!(url.as_str(), "https://shop.test/api/");
    }

    #[test]
    fn test_base_url_rejects_other_schemes() {
        let err = parse_base_url("TEST", "ftp://shop.test/api").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(parse_base_url("TEST", "not a url").is_err());
    }

    #[test]
    fn test_with_base_url_defaults() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:9000").unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.product_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.state_dir, PathBuf::from(".fitwear"));
        assert!(config.sentry_dsn.is_none());
    }
}
