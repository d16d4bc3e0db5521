//! Mistral provider descriptor.

use podmeta_core::ProviderKind;

use crate::descriptor::{ApiConfig, CliConfig, DescriptorMetadata, ProviderDescriptor};

/// Default Mistral API base URL.
pub const MISTRAL_BASE_URL: &str = "https://api.mistral.ai/v1";

/// Builds the Mistral descriptor.
pub fn mistral_descriptor() -> ProviderDescriptor {
    ProviderDescriptor::builder(ProviderKind::Mistral)
        .metadata(DescriptorMetadata {
            display_name: "Mistral",
            console_url: "https://console.mistral.ai/api-keys",
            key_prefix: None,
        })
        .api(ApiConfig {
            base_url: MISTRAL_BASE_URL,
            ..ApiConfig::default()
        })
        .model("pixtral-large-latest", "Pixtral Large")
        .model("mistral-medium-latest", "Mistral Medium")
        .model("pixtral-12b-2409", "Pixtral 12B")
        .cli(CliConfig {
            name: "mistral",
            aliases: &["pixtral"],
        })
        .build()
}
