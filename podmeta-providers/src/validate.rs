//! API key validation.
//!
//! A key is checked by listing models, which costs no tokens.

use podmeta_core::ProviderKind;
use podmeta_fetch::{FetchContext, FetchError, HttpError, ResponseExt};
use tracing::{debug, instrument};

use crate::chat::error_message;
use crate::descriptor::{ProviderDescriptor, endpoint};

/// Checks a key against `GET {base}/models`.
///
/// # Errors
///
/// Returns the classified [`FetchError`] when the provider rejects the key
/// or cannot be reached.
#[instrument(skip(ctx, descriptor, key), fields(provider = %descriptor.id))]
pub async fn validate_key(
    ctx: &FetchContext,
    descriptor: &ProviderDescriptor,
    base_url: Option<&str>,
    key: &str,
) -> Result<(), FetchError> {
    let provider: ProviderKind = descriptor.id;
    let url = endpoint(descriptor.base_url(base_url), descriptor.api.models_path);

    let response = ctx
        .http
        .get_with_auth(&url, key.trim())
        .await
        .map_err(|e| FetchError::from_http(provider, &e))?;

    let status = response.status();
    if status.is_success() {
        debug!("Key accepted");
        return Ok(());
    }

    let retry_after = response.retry_after_secs();
    let text = response
        .text()
        .await
        .map_err(|e| FetchError::from_http(provider, &HttpError::from(e)))?;

    Err(FetchError::from_status(
        provider,
        descriptor.api.models_path,
        status.as_u16(),
        error_message(&text, status),
        retry_after,
    ))
}
