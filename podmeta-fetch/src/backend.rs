//! Vision backend trait.
//!
//! A backend performs exactly one request against one provider/model with
//! one credential: no retries, no fallback. The pipeline supplies both.

use async_trait::async_trait;
use podmeta_core::{ApiResponse, ImagePayload, Marketplace, RequestTarget};

use crate::context::FetchContext;
use crate::error::FetchError;

/// Issues a single vision request and classifies the outcome.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Returns a short identifier for logging (e.g. `"chat-completions"`).
    fn id(&self) -> &str;

    /// Sends one request and returns the parsed, unnormalized response.
    ///
    /// # Errors
    ///
    /// Returns a classified [`FetchError`] for any non-2xx status, transport
    /// failure, or unparseable body.
    async fn analyze(
        &self,
        ctx: &FetchContext,
        target: &RequestTarget,
        image: &ImagePayload,
        market: Marketplace,
    ) -> Result<ApiResponse, FetchError>;
}
