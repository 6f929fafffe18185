//! Error type shared by every crate in the workspace.

use thiserror::Error;

/// Failures raised while talking to an appliance or the IP ranges source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Host could not be reached, or answered 429/5xx
    #[error("Host unreachable: {0}")]
    Unreachable(String),

    /// Request did not complete within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other transport-level failure
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Credentials were rejected (401/403)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Endpoint or configuration section missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Appliance rejected the request parameters
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The appliance answered but reported a failed action
    #[error("FauxAPI action `{action}` failed: {message}")]
    Api {
        /// Action that was invoked
        action: String,
        /// Message returned in the response envelope
        message: String,
    },

    /// Response body was not the expected JSON
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The configuration document does not have the expected shape
    #[error("Invalid configuration document: {0}")]
    InvalidDocument(String),

    /// Host or source URL cannot form a valid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Client settings could not be turned into a working client
    #[error("Configuration error: {0}")]
    Config(String),

    /// Appliance settings failed validation
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Specialized result type for FauxAPI operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "UNREACHABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Http(_) => "HTTP_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Api { .. } => "API_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::InvalidDocument(_) => "INVALID_DOCUMENT",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }

    /// True for failures that may succeed when the request is repeated.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unreachable(_) | Self::Http(_))
    }

    /// True when the appliance itself reported a problem worth a warning.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Api { .. } | Self::Unauthorized(_) | Self::InvalidDocument(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_failure() -> Error {
        Error::Api {
            action: "config_set".to_string(),
            message: "unable to write config".to_string(),
        }
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(Error::Unreachable("fw".into()).error_code(), "UNREACHABLE");
        assert_eq!(Error::Unauthorized("fw".into()).error_code(), "UNAUTHORIZED");
        assert_eq!(api_failure().error_code(), "API_ERROR");
        assert_eq!(
            Error::InvalidDocument("aliases".into()).error_code(),
            "INVALID_DOCUMENT"
        );
    }

    #[test]
    fn api_failure_names_the_action() {
        assert_eq!(
            api_failure().to_string(),
            "FauxAPI action `config_set` failed: unable to write config"
        );
    }

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(Error::Timeout("t".into()).is_transient());
        assert!(Error::Unreachable("t".into()).is_transient());
        assert!(Error::Http("t".into()).is_transient());
        assert!(!Error::Unauthorized("t".into()).is_transient());
        assert!(!api_failure().is_transient());
    }

    #[test]
    fn appliance_complaints_are_logged() {
        assert!(api_failure().should_log());
        assert!(Error::Unauthorized("t".into()).should_log());
        assert!(!Error::Timeout("t".into()).should_log());
    }

    #[test]
    fn conversions() {
        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::InvalidEndpoint(_)));

        let err: Error = serde_json::from_str::<serde_json::Value>("{invalid")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Parse(_)));
    }
}
