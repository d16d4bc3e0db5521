//! Fetch error types.
//!
//! [`FetchError`] is classified exactly once, where the HTTP outcome is
//! observed, and carries an explicit [`ErrorKind`]. Nothing downstream
//! inspects message text.

use podmeta_core::{ProviderKind, ProviderStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Kind
// ============================================================================

/// Classification of a failed vision request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// HTTP 401/403.
    InvalidCredential,
    /// HTTP 429.
    RateLimited,
    /// HTTP 5xx.
    ServerOverloaded,
    /// HTTP 404 for a model identifier.
    ModelUnavailable,
    /// Any other 4xx, or a request that could not be sent as configured.
    RequestRejected,
    /// Envelope or content did not parse.
    MalformedResponse,
    /// Connect failure or timeout.
    Network,
    /// No provider passed the eligibility check.
    NoProviderAvailable,
    /// The caller cancelled the request.
    Cancelled,
}

impl ErrorKind {
    /// Returns true if a failure of this kind may succeed after a delay.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerOverloaded | Self::Network)
    }

    /// Provider status to report after a terminal failure of this kind.
    pub fn provider_status(&self) -> ProviderStatus {
        match self {
            Self::RateLimited => ProviderStatus::RateLimited,
            _ => ProviderStatus::Error,
        }
    }

    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "invalid credential",
            Self::RateLimited => "rate limited",
            Self::ServerOverloaded => "server overloaded",
            Self::ModelUnavailable => "model unavailable",
            Self::RequestRejected => "request rejected",
            Self::MalformedResponse => "malformed response",
            Self::Network => "network error",
            Self::NoProviderAvailable => "no provider available",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for vision requests.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The provider rejected the API key.
    #[error("{provider}: invalid API key: {message}")]
    InvalidCredential {
        /// Provider that rejected the key.
        provider: ProviderKind,
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Provider message.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("{provider}: rate limit exceeded: {message}")]
    RateLimited {
        /// Provider that rate limited the request.
        provider: ProviderKind,
        /// Seconds to wait before retrying, from `Retry-After`.
        retry_after: Option<u64>,
        /// Provider message.
        message: String,
    },

    /// The provider returned a 5xx status.
    #[error("{provider}: server error ({status}): {message}")]
    ServerOverloaded {
        /// Provider that failed.
        provider: ProviderKind,
        /// HTTP status.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// The model identifier is not served by the provider.
    #[error("{provider}: model {model} unavailable: {message}")]
    ModelUnavailable {
        /// Provider queried.
        provider: ProviderKind,
        /// Model identifier that was not found.
        model: String,
        /// Provider message.
        message: String,
    },

    /// The provider rejected the request with another 4xx status.
    #[error("{provider}: request rejected ({status}): {message}")]
    RequestRejected {
        /// Provider that rejected the request.
        provider: ProviderKind,
        /// HTTP status.
        status: u16,
        /// Provider message.
        message: String,
    },

    /// The configured endpoint is not a usable URL.
    #[error("{provider}: invalid endpoint: {message}")]
    InvalidEndpoint {
        /// Provider whose base URL is invalid.
        provider: ProviderKind,
        /// URL validation detail.
        message: String,
    },

    /// The response could not be parsed as metadata.
    #[error("{provider}: analysis failed: {message}")]
    MalformedResponse {
        /// Provider that answered.
        provider: ProviderKind,
        /// HTTP status of the response.
        status: Option<u16>,
        /// Parse failure detail.
        message: String,
    },

    /// The request did not complete at the transport level.
    #[error("{provider}: network error: {message}")]
    Network {
        /// Provider being called.
        provider: ProviderKind,
        /// Transport failure detail.
        message: String,
    },

    /// No provider was eligible to handle the request.
    #[error("No active provider available. Add an API key for Mistral or Groq and make sure the provider is enabled.")]
    NoProviderAvailable,

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Classifies a non-2xx HTTP response.
    pub fn from_status(
        provider: ProviderKind,
        model: &str,
        status: u16,
        message: impl Into<String>,
        retry_after: Option<u64>,
    ) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::InvalidCredential {
                provider,
                status: Some(status),
                message,
            },
            404 => Self::ModelUnavailable {
                provider,
                model: model.to_string(),
                message,
            },
            429 => Self::RateLimited {
                provider,
                retry_after,
                message,
            },
            s if s >= 500 => Self::ServerOverloaded {
                provider,
                status: s,
                message,
            },
            s => Self::RequestRejected {
                provider,
                status: s,
                message,
            },
        }
    }

    /// Classifies a transport error.
    ///
    /// A URL that fails validation is a configuration problem and is never
    /// retried.
    pub fn from_http(provider: ProviderKind, err: &HttpError) -> Self {
        match err {
            HttpError::InvalidUrl(message) => Self::InvalidEndpoint {
                provider,
                message: message.clone(),
            },
            HttpError::Request(_) | HttpError::Timeout(_) => Self::Network {
                provider,
                message: err.to_string(),
            },
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(provider: ProviderKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredential { .. } => ErrorKind::InvalidCredential,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ServerOverloaded { .. } => ErrorKind::ServerOverloaded,
            Self::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            Self::RequestRejected { .. } | Self::InvalidEndpoint { .. } => ErrorKind::RequestRejected,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Network { .. } => ErrorKind::Network,
            Self::NoProviderAvailable => ErrorKind::NoProviderAvailable,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns the HTTP status, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredential { status, .. } | Self::MalformedResponse { status, .. } => {
                *status
            }
            Self::RateLimited { .. } => Some(429),
            Self::ModelUnavailable { .. } => Some(404),
            Self::ServerOverloaded { status, .. } | Self::RequestRejected { status, .. } => {
                Some(*status)
            }
            Self::InvalidEndpoint { .. }
            | Self::Network { .. }
            | Self::NoProviderAvailable
            | Self::Cancelled => None,
        }
    }

    /// Returns the provider the error came from.
    pub fn provider(&self) -> Option<ProviderKind> {
        match self {
            Self::InvalidCredential { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::ServerOverloaded { provider, .. }
            | Self::ModelUnavailable { provider, .. }
            | Self::RequestRejected { provider, .. }
            | Self::InvalidEndpoint { provider, .. }
            | Self::MalformedResponse { provider, .. }
            | Self::Network { provider, .. } => Some(*provider),
            Self::NoProviderAvailable | Self::Cancelled => None,
        }
    }

    /// Returns true if the request may be retried.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns the server-requested wait in seconds, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Returns a user-facing hint for this failure.
    pub fn user_hint(&self) -> Option<&'static str> {
        match self.kind() {
            ErrorKind::InvalidCredential => Some("Check that your API key is correct and still active."),
            ErrorKind::RateLimited => Some("Rate limit hit. Try adding more keys to your pool."),
            ErrorKind::ServerOverloaded => Some("The provider is overloaded. Try again in a few minutes."),
            ErrorKind::NoProviderAvailable => Some("Run `podmeta keys add <provider> <key>` to configure a provider."),
            ErrorKind::Network => Some("Check your network connection."),
            ErrorKind::MalformedResponse => Some("The model returned unusable output. Try again."),
            _ => None,
        }
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Credential not found.
    #[error("Credential not found for {service}/{account}")]
    NotFound {
        /// Service name.
        service: String,
        /// Account name.
        account: String,
    },

    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => KeychainError::NotFound {
                service: String::new(),
                account: String::new(),
            },
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        let p = ProviderKind::Groq;
        let kind = |status| FetchError::from_status(p, "m", status, "x", None).kind();
        assert_eq!(kind(401), ErrorKind::InvalidCredential);
        assert_eq!(kind(403), ErrorKind::InvalidCredential);
        assert_eq!(kind(404), ErrorKind::ModelUnavailable);
        assert_eq!(kind(429), ErrorKind::RateLimited);
        assert_eq!(kind(500), ErrorKind::ServerOverloaded);
        assert_eq!(kind(503), ErrorKind::ServerOverloaded);
        assert_eq!(kind(400), ErrorKind::RequestRejected);
        assert_eq!(kind(422), ErrorKind::RequestRejected);
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::ServerOverloaded.is_retryable());
        assert!(ErrorKind::Network.is_retryable());
        assert!(!ErrorKind::InvalidCredential.is_retryable());
        assert!(!ErrorKind::ModelUnavailable.is_retryable());
        assert!(!ErrorKind::MalformedResponse.is_retryable());
    }

    #[test]
    fn test_message_has_provider_prefix() {
        let err = FetchError::from_status(ProviderKind::Mistral, "m", 401, "Unauthorized", None);
        assert_eq!(err.to_string(), "Mistral: invalid API key: Unauthorized");
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.provider(), Some(ProviderKind::Mistral));
    }

    #[test]
    fn test_provider_status_mapping() {
        assert_eq!(ErrorKind::RateLimited.provider_status(), ProviderStatus::RateLimited);
        assert_eq!(ErrorKind::ServerOverloaded.provider_status(), ProviderStatus::Error);
        assert_eq!(ErrorKind::InvalidCredential.provider_status(), ProviderStatus::Error);
    }

    #[test]
    fn test_invalid_url_is_not_retryable() {
        let err = FetchError::from_http(
            ProviderKind::Mistral,
            &HttpError::InvalidUrl("unsupported scheme: ftp".into()),
        );
        assert_eq!(err.kind(), ErrorKind::RequestRejected);
        assert!(!err.is_retryable());
        assert_eq!(err.provider(), Some(ProviderKind::Mistral));
        assert_eq!(err.to_string(), "Mistral: invalid endpoint: unsupported scheme: ftp");

        let err = FetchError::from_http(ProviderKind::Groq, &HttpError::Timeout(1));
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_retry_after_only_on_rate_limit() {
        let err = FetchError::from_status(ProviderKind::Groq, "m", 429, "slow down", Some(7));
        assert_eq!(err.retry_after(), Some(7));
        assert!(err.user_hint().unwrap().contains("more keys"));

        let err = FetchError::from_status(ProviderKind::Groq, "m", 503, "busy", Some(7));
        assert_eq!(err.retry_after(), None);
    }
}
