//! Fetch context shared by every vision request.
//!
//! The context bundles the HTTP client, the retry policy, and the caller's
//! cancellation token.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::host::http::{DEFAULT_TIMEOUT_SECS, HttpClient};
use crate::retry::RetryStrategy;

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for fetch operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Timeout for a single HTTP request.
    pub timeout: Duration,
    /// Retry policy applied per model.
    pub retry: RetryStrategy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryStrategy::default(),
        }
    }
}

impl FetchSettings {
    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryStrategy) -> Self {
        self.retry = retry;
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Context provided to vision backends.
pub struct FetchContext {
    /// HTTP client with tracing.
    pub http: Arc<HttpClient>,
    /// Fetch settings.
    pub settings: FetchSettings,
    /// Cancelled by the caller to abort retries and in-flight requests.
    pub cancel: CancellationToken,
}

impl FetchContext {
    /// Creates a new fetch context with default settings.
    pub fn new() -> Self {
        Self::with_settings(FetchSettings::default())
    }

    /// Creates a context with custom settings.
    pub fn with_settings(settings: FetchSettings) -> Self {
        Self::builder().settings(settings).build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Returns the retry policy.
    pub fn retry(&self) -> &RetryStrategy {
        &self.settings.retry
    }

    /// Returns true once the caller has cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchContext")
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
pub struct FetchContextBuilder {
    http: Option<Arc<HttpClient>>,
    settings: FetchSettings,
    cancel: Option<CancellationToken>,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            http: None,
            settings: FetchSettings::default(),
            cancel: None,
        }
    }

    /// Sets the HTTP client. Overrides the timeout setting.
    pub fn http(mut self, http: Arc<HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    /// Sets the fetch settings.
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    pub fn retry(mut self, retry: RetryStrategy) -> Self {
        self.settings.retry = retry;
        self
    }

    /// Sets the cancellation token.
    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        let timeout = self.settings.timeout;
        FetchContext {
            http: self
                .http
                .unwrap_or_else(|| Arc::new(HttpClient::with_timeout(timeout))),
            settings: self.settings,
            cancel: self.cancel.unwrap_or_else(CancellationToken::new),
        }
    }
}

impl Default for FetchContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let ctx = FetchContext::builder()
            .timeout(Duration::from_secs(10))
            .retry(RetryStrategy::no_retry())
            .build();

        assert_eq!(ctx.settings.timeout, Duration::from_secs(10));
        assert_eq!(ctx.http.timeout(), Duration::from_secs(10));
        assert_eq!(ctx.retry().max_retries, 0);
    }

    #[test]
    fn test_default_context() {
        let ctx = FetchContext::new();
        assert_eq!(ctx.settings.timeout, Duration::from_secs(60));
        assert_eq!(ctx.retry().max_retries, 3);
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_shared_cancel_token() {
        let token = CancellationToken::new();
        let ctx = FetchContext::builder().cancel(token.clone()).build();
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
