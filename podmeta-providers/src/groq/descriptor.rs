//! Groq provider descriptor.

use podmeta_core::ProviderKind;

use crate::descriptor::{ApiConfig, CliConfig, DescriptorMetadata, ProviderDescriptor};

/// Default Groq API base URL.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Builds the Groq descriptor.
pub fn groq_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Groq)
        .metadata(DescriptorMetadata {
            display_name: "Groq",
            console_url: "https://console.groq.com/keys",
            key_prefix: Some("gsk_"),
        })
        .api(ApiConfig {
            base_url: GROQ_BASE_URL,
            ..ApiConfig::default()
        })
        .model("meta-llama/llama-4-maverick-17b-128e-instruct", "Llama 4 Maverick")
        .model("meta-llama/llama-4-scout-17b-16e-instruct", "Llama 4 Scout")
        .model("llama-3.2-11b-vision-preview", "Llama 3.2 11B Vision")
        .cli(CliConfig {
            name: "groq",
            aliases: &["llama"],
        })
        .build()
}
