//! Configuration for connecting to a FauxAPI appliance.
//!
//! This module provides the connection settings for a single pfSense host,
//! including credential loading from the environment and validation.

use crate::auth::Credentials;
use crate::client::{ClientConfig, RetryPolicy, DEFAULT_MAX_RETRIES, FAUXAPI_DEFAULT_TIMEOUT};
use crate::Error;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "FAUXAPI_APIKEY";

/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "FAUXAPI_APISECRET";

/// Environment variable enabling TLS certificate verification.
pub const ENV_TLS_VERIFY: &str = "FAUXAPI_TLS_VERIFY";

/// Path of the FauxAPI endpoint on the appliance.
pub const API_PATH: &str = "/fauxapi/v1/";

/// Connection configuration for one FauxAPI appliance.
#[derive(Debug, Clone, Validate)]
pub struct FauxapiConfig {
    /// Target host, either a bare host[:port] or a full `http(s)://` origin
    #[validate(length(min = 1))]
    pub host: String,

    /// Signing credentials
    pub credentials: Credentials,

    /// Whether to verify TLS certificates
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Maximum number of retry attempts for read-only actions
    #[validate(range(min = 0, max = 10))]
    pub max_retries: u32,
}

impl FauxapiConfig {
    /// Create a new configuration for `host` with the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the host is empty, [`Error::Config`] if a
    /// credential is empty, or an error if the resulting API URL cannot be parsed.
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Result<Self, Error> {
        let config = Self {
            host: host.into(),
            credentials,
            tls_verify: false,
            request_timeout_secs: FAUXAPI_DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        };

        config.validate()?;

        if config.credentials.is_incomplete() {
            return Err(Error::Config(
                "API key and API secret must both be set".to_string(),
            ));
        }

        config.base_url()?;
        Ok(config)
    }

    /// Build a configuration for `host`, reading credentials from
    /// [`ENV_API_KEY`] and [`ENV_API_SECRET`].
    ///
    /// [`ENV_TLS_VERIFY`] set to `1` or `true` turns certificate verification on.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either credential variable is unset or empty.
    pub fn from_env(host: impl Into<String>) -> Result<Self, Error> {
        let api_key = read_env(ENV_API_KEY)?;
        let api_secret = read_env(ENV_API_SECRET)?;
        let tls_verify = std::env::var(ENV_TLS_VERIFY)
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true"))
            .unwrap_or(false);

        Ok(Self::new(host, Credentials::new(api_key, api_secret))?.with_tls_verify(tls_verify))
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set maximum retry attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// HTTP settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> ClientConfig {
        ClientConfig::appliance()
            .with_timeout(self.timeout())
            .with_tls_verify(self.tls_verify)
            .with_retry_policy(RetryPolicy::new().with_max_retries(self.max_retries))
    }

    /// The FauxAPI endpoint URL for this host.
    ///
    /// # Errors
    ///
    /// Returns an error if the host does not form a valid URL.
    pub fn base_url(&self) -> Result<Url, Error> {
        let host = self.host.trim().trim_end_matches('/');
        let origin = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        };

        Url::parse(&origin)
            .and_then(|url| url.join(API_PATH))
            .map_err(|e| Error::Config(format!("Invalid FauxAPI host `{}`: {e}", self.host)))
    }
}

fn read_env(name: &str) -> Result<String, Error> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::Config(format!(
            "environment variable {name} must be set"
        ))),
    }
}
