//! HTTP settings shared by the appliance client and the IP ranges fetcher.
//!
//! Two profiles exist: [`ClientConfig::appliance`] talks to a firewall that
//! usually presents a self-signed certificate, [`ClientConfig::ip_ranges`]
//! downloads a public document and always verifies TLS.

use crate::error::{Error, Result};
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::warn;

/// Default timeout for FauxAPI requests (in seconds)
pub const FAUXAPI_DEFAULT_TIMEOUT: u64 = 30;

/// Default timeout for downloading the published IP ranges (in seconds)
pub const IP_RANGES_DEFAULT_TIMEOUT: u64 = 30;

/// Connect timeout applied to every profile (in seconds)
pub const CONNECT_TIMEOUT: u64 = 10;

/// Default number of retries for read-only actions
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Delay before the first retry, in milliseconds
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Upper bound on the delay between retries, in milliseconds
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 5000;

/// Doubling backoff for read-only actions.
///
/// Write actions get a budget of zero no matter how the policy is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap applied after doubling.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Policy with the default delays and no retries.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
        }
    }

    /// Set the maximum number of retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the delay cap.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Retries available to an action.
    #[must_use]
    pub const fn budget(&self, read_only: bool) -> u32 {
        if read_only {
            self.max_retries
        } else {
            0
        }
    }

    /// Delay before retry number `attempt` (1-based); zero for attempt 0.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match attempt {
            0 => Duration::ZERO,
            n => {
                let factor = 1u32.checked_shl(n - 1).unwrap_or(u32::MAX);
                self.initial_delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings used to build a [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Retry policy applied by the caller.
    pub retry_policy: RetryPolicy,
    /// Whether TLS certificates are verified.
    pub tls_verify: bool,
}

impl ClientConfig {
    /// Profile for a FauxAPI appliance: certificates are not verified.
    #[must_use]
    pub const fn appliance() -> Self {
        Self {
            timeout: Duration::from_secs(FAUXAPI_DEFAULT_TIMEOUT),
            retry_policy: RetryPolicy::new(),
            tls_verify: false,
        }
    }

    /// Profile for downloading `ip-ranges.json`: verified TLS, no retries.
    #[must_use]
    pub const fn ip_ranges() -> Self {
        Self {
            timeout: Duration::from_secs(IP_RANGES_DEFAULT_TIMEOUT),
            retry_policy: RetryPolicy::new().with_max_retries(0),
            tls_verify: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Enable or disable TLS certificate verification.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Build a gzip-enabled [`reqwest::Client`] from these settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the underlying client cannot be constructed.
    pub fn build_http_client(&self, user_agent: &str) -> Result<Client> {
        let builder = ClientBuilder::new()
            .user_agent(user_agent)
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
            .gzip(true);

        let builder = if self.tls_verify {
            builder
        } else {
            warn!(user_agent, "TLS certificate verification disabled");
            builder.danger_accept_invalid_certs(true)
        };

        builder
            .build()
            .map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::appliance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_never_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.budget(true), 0);
        assert_eq!(policy.budget(false), 0);
    }

    #[test]
    fn writes_get_no_budget() {
        let policy = RetryPolicy::new().with_max_retries(4);
        assert_eq!(policy.budget(true), 4);
        assert_eq!(policy.budget(false), 0);
    }

    #[test]
    fn delays_double_up_to_the_cap() {
        let policy = RetryPolicy::new()
            .with_initial_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(5));

        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(6), Duration::from_millis(3200));
        assert_eq!(policy.delay_for_attempt(7), Duration::from_secs(5));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(5));
    }

    #[test]
    fn profiles_differ_on_tls() {
        assert!(!ClientConfig::appliance().tls_verify);
        assert!(ClientConfig::ip_ranges().tls_verify);
        assert_eq!(ClientConfig::ip_ranges().retry_policy.max_retries, 0);
        assert_eq!(
            ClientConfig::default().timeout,
            Duration::from_secs(FAUXAPI_DEFAULT_TIMEOUT)
        );
    }

    #[test]
    fn builds_with_and_without_verification() {
        assert!(ClientConfig::appliance()
            .build_http_client("fauxapi-test/0.1")
            .is_ok());
        assert!(ClientConfig::ip_ranges()
            .build_http_client("fauxapi-test/0.1")
            .is_ok());
    }
}
