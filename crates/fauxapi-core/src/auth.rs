//! `fauxapi-auth` request signing.
//!
//! Every FauxAPI request carries a header of the form
//! `<apikey>:<timestamp>:<nonce>:<hash>` where `hash` is the hex SHA-256 of
//! `apisecret + timestamp + nonce`.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Name of the header carrying the request signature.
pub const AUTH_HEADER: &str = "fauxapi-auth";

/// Timestamp layout expected by the appliance (UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dZ%H%M%S";

/// Length of the per-request nonce.
pub const NONCE_LENGTH: usize = 8;

/// API key and secret pair used to sign requests.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    /// Create a credential pair.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// The public API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// True when either half of the pair is empty.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        self.api_key.is_empty() || self.api_secret.expose_secret().is_empty()
    }

    /// Build the header value for the current time with a fresh nonce.
    #[must_use]
    pub fn sign_now(&self) -> String {
        self.sign(Utc::now(), &generate_nonce())
    }

    /// Build the header value for an explicit timestamp and nonce.
    #[must_use]
    pub fn sign(&self, timestamp: DateTime<Utc>, nonce: &str) -> String {
        let timestamp = timestamp.format(TIMESTAMP_FORMAT).to_string();

        let mut hasher = Sha256::new();
        hasher.update(self.api_secret.expose_secret().as_bytes());
        hasher.update(timestamp.as_bytes());
        hasher.update(nonce.as_bytes());
        let hash = hex::encode(hasher.finalize());

        format!("{}:{timestamp}:{nonce}:{hash}", self.api_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Generate an alphanumeric nonce of [`NONCE_LENGTH`] characters.
#[must_use]
pub fn generate_nonce() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(NONCE_LENGTH)
        .collect()
}
