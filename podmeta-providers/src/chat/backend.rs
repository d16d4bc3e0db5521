//! Chat-completions vision backend.

use async_trait::async_trait;
use podmeta_core::{ApiResponse, ImagePayload, Marketplace, RequestTarget};
use podmeta_fetch::{FetchContext, FetchError, HttpError, ResponseExt, VisionBackend};
use tracing::{debug, instrument, warn};

use super::parser::{error_message, parse_chat_response};
use super::wire::ChatRequest;
use crate::descriptor::{ApiConfig, endpoint};

/// Sends vision requests to any OpenAI-compatible chat-completions API.
///
/// Mistral and Groq share this backend; they differ only in base URL and
/// model identifiers, which arrive through the [`RequestTarget`].
#[derive(Debug, Clone)]
pub struct ChatCompletionsBackend {
    chat_path: &'static str,
}

impl ChatCompletionsBackend {
    /// Creates a backend using the standard `/chat/completions` path.
    pub fn new() -> Self {
        Self {
            chat_path: ApiConfig::default().chat_path,
        }
    }
}

impl Default for ChatCompletionsBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionBackend for ChatCompletionsBackend {
    fn id(&self) -> &str {
        "chat-completions"
    }

    #[instrument(skip(self, ctx, target, image), fields(provider = %target.provider, model = %target.model))]
    async fn analyze(
        &self,
        ctx: &FetchContext,
        target: &RequestTarget,
        image: &ImagePayload,
        market: Marketplace,
    ) -> Result<ApiResponse, FetchError> {
        let provider = target.provider;
        let url = endpoint(&target.base_url, self.chat_path);
        let body = ChatRequest::vision(&target.model, image, market);

        let response = ctx
            .http
            .post_json_with_auth(&url, &target.credential, &body)
            .await
            .map_err(|e| FetchError::from_http(provider, &e))?;

        let status = response.status();
        let retry_after = response.retry_after_secs();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::from_http(provider, &HttpError::from(e)))?;

        if !status.is_success() {
            let message = error_message(&text, status);
            warn!(status = status.as_u16(), %message, "Vision request failed");
            return Err(FetchError::from_status(
                provider,
                &target.model,
                status.as_u16(),
                message,
                retry_after,
            ));
        }

        debug!(len = text.len(), "Vision request succeeded");
        parse_chat_response(provider, status.as_u16(), &text)
    }
}
