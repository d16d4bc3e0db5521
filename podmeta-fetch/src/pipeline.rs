//! Provider/model fallback pipeline.
//!
//! The pipeline walks providers in priority order, then each provider's
//! models in capability order, running every model through the retry
//! policy until one request succeeds. The raw response is normalized for
//! the requested marketplace before it is returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use podmeta_core::{
    CredentialPool, ImagePayload, Marketplace, ModelDescriptor, NormalizedMetadata,
    ProviderConfigSet, ProviderKind, ProviderRoute, ProviderSettings, ProviderStatus,
    RequestTarget, StatusReporter, StatusUpdate, normalize,
};
use tracing::{debug, info, instrument, warn};

use crate::backend::VisionBackend;
use crate::context::FetchContext;
use crate::error::{ErrorKind, FetchError};

// ============================================================================
// Analysis Attempt
// ============================================================================

/// Record of one provider/model tried during a pipeline run.
#[derive(Debug, Clone)]
pub struct AnalysisAttempt {
    /// Provider tried.
    pub provider: ProviderKind,
    /// Model tried.
    pub model: String,
    /// Whether the model produced a result.
    pub success: bool,
    /// Classification of the final failure.
    pub error_kind: Option<ErrorKind>,
    /// Message of the final failure.
    pub error: Option<String>,
    /// Requests sent, including retries.
    pub tries: u32,
    /// Time spent on this model, including backoff.
    pub duration: Duration,
}

impl AnalysisAttempt {
    /// Creates a successful attempt record.
    pub fn success(provider: ProviderKind, model: impl Into<String>, tries: u32, duration: Duration) -> Self {
        Self {
            provider,
            model: model.into(),
            success: true,
            error_kind: None,
            error: None,
            tries,
            duration,
        }
    }

    /// Creates a failed attempt record.
    pub fn failure(
        provider: ProviderKind,
        model: impl Into<String>,
        error: &FetchError,
        tries: u32,
        duration: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            success: false,
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            tries,
            duration,
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Normalized metadata plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMetadata {
    /// Marketplace-compliant metadata.
    pub metadata: NormalizedMetadata,
    /// Provider that answered.
    pub provider: ProviderKind,
    /// Model that answered.
    pub model: String,
}

/// The outcome of a pipeline run.
#[derive(Debug)]
pub struct AnalysisOutcome {
    /// The result (success or final error).
    pub result: Result<GeneratedMetadata, FetchError>,
    /// Every provider/model tried, in order.
    pub attempts: Vec<AnalysisAttempt>,
    /// Total duration.
    pub duration: Duration,
}

impl AnalysisOutcome {
    /// Returns true if metadata was generated.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the number of provider/model pairs tried.
    pub fn attempts_count(&self) -> usize {
        self.attempts.len()
    }

    /// Returns the provider that succeeded, if any.
    pub fn successful_provider(&self) -> Option<ProviderKind> {
        self.result.as_ref().ok().map(|r| r.provider)
    }

    /// Returns all errors that occurred.
    pub fn errors(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter_map(|a| a.error.as_deref())
            .collect()
    }
}

// ============================================================================
// Vision Pipeline
// ============================================================================

/// Provider/model fallback orchestrator.
pub struct VisionPipeline {
    backend: Arc<dyn VisionBackend>,
    routes: Vec<ProviderRoute>,
    pool: Arc<CredentialPool>,
}

impl VisionPipeline {
    /// Creates a pipeline over `routes`, tried in the given order.
    pub fn new(backend: Arc<dyn VisionBackend>, routes: Vec<ProviderRoute>) -> Self {
        Self {
            backend,
            routes,
            pool: Arc::new(CredentialPool::new()),
        }
    }

    /// Uses `pool` for credential rotation.
    pub fn with_pool(mut self, pool: Arc<CredentialPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Returns the fallback plan.
    pub fn routes(&self) -> &[ProviderRoute] {
        &self.routes
    }

    /// Returns the credential pool.
    pub fn pool(&self) -> &Arc<CredentialPool> {
        &self.pool
    }

    /// Returns why a provider cannot be used, or `None` if it is eligible.
    fn skip_reason(&self, route: &ProviderRoute, settings: &ProviderSettings) -> Option<&'static str> {
        if !settings.is_active {
            Some("inactive")
        } else if self.pool.is_empty(route.provider) && settings.api_key().is_none() {
            Some("no API key")
        } else if settings.status == ProviderStatus::RateLimited {
            Some("rate limited")
        } else if route.models.is_empty() {
            Some("no models")
        } else {
            None
        }
    }

    /// Builds the target for one attempt, drawing the next pooled key.
    fn target_for(
        &self,
        route: &ProviderRoute,
        model: &ModelDescriptor,
        settings: &ProviderSettings,
    ) -> RequestTarget {
        let credential = self
            .pool
            .next_credential(route.provider)
            .or_else(|| settings.api_key().map(str::to_string))
            .unwrap_or_default();

        RequestTarget {
            provider: route.provider,
            model: model.id.clone(),
            credential,
            base_url: route.base_url.clone(),
        }
    }

    /// Tries every model of one provider. Returns the terminal error, or the
    /// last model-unavailable error if every model was missing.
    async fn try_provider(
        &self,
        ctx: &FetchContext,
        route: &ProviderRoute,
        settings: &ProviderSettings,
        image: &ImagePayload,
        market: Marketplace,
        attempts: &mut Vec<AnalysisAttempt>,
    ) -> Result<GeneratedMetadata, FetchError> {
        let provider = route.provider;
        let backend = &self.backend;
        let mut unavailable = None;

        for model in &route.models {
            debug!(provider = %provider, model = %model.id, "Trying model");
            let started = Instant::now();

            let retried = ctx
                .retry()
                .execute(&ctx.cancel, |_| {
                    let target = self.target_for(route, model, settings);
                    async move { backend.analyze(ctx, &target, image, market).await }
                })
                .await;
            let duration = started.elapsed();

            match retried.result {
                Ok(raw) => {
                    attempts.push(AnalysisAttempt::success(provider, &model.id, retried.tries, duration));
                    return Ok(GeneratedMetadata {
                        metadata: normalize(&raw, market),
                        provider,
                        model: model.id.clone(),
                    });
                }
                Err(error) => {
                    warn!(
                        provider = %provider,
                        model = %model.id,
                        kind = %error.kind(),
                        tries = retried.tries,
                        error = %error,
                        "Model failed"
                    );
                    attempts.push(AnalysisAttempt::failure(
                        provider,
                        &model.id,
                        &error,
                        retried.tries,
                        duration,
                    ));

                    if error.kind() != ErrorKind::ModelUnavailable {
                        return Err(error);
                    }
                    unavailable = Some(error);
                }
            }
        }

        Err(unavailable.unwrap_or(FetchError::NoProviderAvailable))
    }

    /// Runs the fallback plan for one image.
    ///
    /// `reporter` receives `Active` for the provider that succeeds and
    /// `RateLimited`/`Error` for each provider that fails terminally.
    /// Skipped providers are never reported.
    #[instrument(skip_all, fields(market = %market, routes = self.routes.len()))]
    pub async fn execute(
        &self,
        ctx: &FetchContext,
        image: &ImagePayload,
        market: Marketplace,
        config: &ProviderConfigSet,
        reporter: &dyn StatusReporter,
    ) -> AnalysisOutcome {
        let start = Instant::now();
        let mut attempts = Vec::new();
        let mut last_error = None;

        for route in &self.routes {
            let provider = route.provider;
            let settings = config.get(provider).cloned().unwrap_or_default();

            if let Some(reason) = self.skip_reason(route, &settings) {
                debug!(provider = %provider, reason, "Skipping provider");
                continue;
            }

            match self
                .try_provider(ctx, route, &settings, image, market, &mut attempts)
                .await
            {
                Ok(generated) => {
                    reporter.report(StatusUpdate::new(provider, ProviderStatus::Active));
                    info!(
                        provider = %provider,
                        model = %generated.model,
                        duration = ?start.elapsed(),
                        "Metadata generated"
                    );
                    return AnalysisOutcome {
                        result: Ok(generated),
                        attempts,
                        duration: start.elapsed(),
                    };
                }
                Err(FetchError::Cancelled) => {
                    debug!(provider = %provider, "Cancelled");
                    return AnalysisOutcome {
                        result: Err(FetchError::Cancelled),
                        attempts,
                        duration: start.elapsed(),
                    };
                }
                Err(error) => {
                    reporter.report(
                        StatusUpdate::new(provider, error.kind().provider_status())
                            .with_message(error.to_string()),
                    );
                    last_error = Some(error);
                }
            }
        }

        let error = last_error.unwrap_or(FetchError::NoProviderAvailable);
        warn!(error = %error, attempts = attempts.len(), "All providers failed");
        AnalysisOutcome {
            result: Err(error),
            attempts,
            duration: start.elapsed(),
        }
    }

    /// Runs the fallback plan and returns only the result.
    ///
    /// # Errors
    ///
    /// Returns the last provider's error, or
    /// [`FetchError::NoProviderAvailable`] if no provider was eligible.
    pub async fn generate_metadata(
        &self,
        ctx: &FetchContext,
        image: &ImagePayload,
        market: Marketplace,
        config: &ProviderConfigSet,
        reporter: &dyn StatusReporter,
    ) -> Result<GeneratedMetadata, FetchError> {
        self.execute(ctx, image, market, config, reporter).await.result
    }
}

impl std::fmt::Debug for VisionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionPipeline")
            .field("backend", &self.backend.id())
            .field("routes", &self.routes)
            .field("pool", &self.pool)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
