// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Podmeta Providers
//!
//! Vision provider implementations for Podmeta.
//!
//! Both supported providers expose an OpenAI-compatible chat-completions API,
//! so they share one backend ([`chat::ChatCompletionsBackend`]) and differ
//! only in their descriptor: base URL, model list and CLI names.
//!
//! ## Supported Providers
//!
//! | Provider | Base URL | Models (fallback order) |
//! |----------|----------|-------------------------|
//! | Mistral | `https://api.mistral.ai/v1` | Pixtral Large, Mistral Medium, Pixtral 12B |
//! | Groq | `https://api.groq.com/openai/v1` | Llama 4 Maverick, Llama 4 Scout, Llama 3.2 11B Vision |
//!
//! ## Usage
//!
//! ```ignore
//! use podmeta_providers::build_pipeline;
//! use podmeta_fetch::FetchContext;
//!
//! let pipeline = build_pipeline(&config, pool);
//! let ctx = FetchContext::new();
//! let generated = pipeline
//!     .generate_metadata(&ctx, &image, Marketplace::Zazzle, &config, &reporter)
//!     .await?;
//! ```

use std::sync::Arc;

use podmeta_core::{CredentialPool, ProviderConfigSet};
use podmeta_fetch::VisionPipeline;

pub mod chat;
pub mod descriptor;
pub mod registry;
pub mod validate;

// Provider modules (alphabetical)
pub mod groq;
pub mod mistral;


// Re-export key types
pub use chat::ChatCompletionsBackend;
pub use descriptor::{
    ApiConfig, CliConfig, DescriptorMetadata, ProviderDescriptor, ProviderDescriptorBuilder,
};
pub use registry::ProviderRegistry;
pub use validate::validate_key;

// Re-export provider descriptors
pub use groq::groq_descriptor;
pub use mistral::mistral_descriptor;

/// Builds the Mistral-then-Groq fallback pipeline for the given settings.
pub fn build_pipeline(config: &ProviderConfigSet, pool: Arc<CredentialPool>) -> VisionPipeline {
    VisionPipeline::new(
        Arc::new(ChatCompletionsBackend::new()),
        ProviderRegistry::routes(config),
    )
    .with_pool(pool)
}
