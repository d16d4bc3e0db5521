//! Provider descriptor system.
//!
//! A descriptor contains all the static configuration for a provider:
//! - Metadata (display name, console URL)
//! - API endpoint configuration
//! - Candidate models in fallback order
//! - CLI configuration

use podmeta_core::{ModelDescriptor, ProviderKind, ProviderRoute};

// ============================================================================
// Provider Descriptor
// ============================================================================

/// Complete descriptor for a vision provider.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Provider identifier.
    pub id: ProviderKind,
    /// Display metadata.
    pub metadata: DescriptorMetadata,
    /// HTTP API configuration.
    pub api: ApiConfig,
    /// Candidate models, most capable first.
    pub models: Vec<ModelDescriptor>,
    /// CLI configuration.
    pub cli: CliConfig,
}

impl ProviderDescriptor {
    /// Creates a new descriptor builder.
    pub fn builder(id: ProviderKind) -> ProviderDescriptorBuilder {
        ProviderDescriptorBuilder::new(id)
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        self.metadata.display_name
    }

    /// Returns the CLI name.
    pub fn cli_name(&self) -> &str {
        self.cli.name
    }

    /// Returns the configured base URL, or the default when no override is set.
    pub fn base_url<'a>(&'a self, override_url: Option<&'a str>) -> &'a str {
        override_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(self.api.base_url)
            .trim_end_matches('/')
    }

    /// Builds the fallback route for this provider.
    pub fn route(&self, override_url: Option<&str>) -> ProviderRoute {
        ProviderRoute {
            provider: self.id,
            base_url: self.base_url(override_url).to_string(),
            models: self.models.clone(),
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Display metadata for a provider.
#[derive(Debug, Clone)]
pub struct DescriptorMetadata {
    /// Human-readable name.
    pub display_name: &'static str,
    /// Where users create API keys.
    pub console_url: &'static str,
    /// Prefix real keys usually start with, if the provider uses one.
    pub key_prefix: Option<&'static str>,
}

impl DescriptorMetadata {
    /// Creates metadata with the provider's default display name.
    pub fn for_provider(id: ProviderKind) -> Self {
        Self {
            display_name: id.display_name(),
            console_url: "",
            key_prefix: None,
        }
    }
}

// ============================================================================
// API Config
// ============================================================================

/// HTTP endpoints of an OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Default base URL, without trailing slash.
    pub base_url: &'static str,
    /// Path of the chat-completions endpoint.
    pub chat_path: &'static str,
    /// Path of the model listing endpoint, used for key validation.
    pub models_path: &'static str,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "",
            chat_path: "/chat/completions",
            models_path: "/models",
        }
    }
}

/// Joins a base URL and an endpoint path.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

// ============================================================================
// CLI Config
// ============================================================================

/// Names accepted on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Primary name.
    pub name: &'static str,
    /// Alternative names.
    pub aliases: &'static [&'static str],
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ProviderDescriptor`].
pub struct ProviderDescriptorBuilder {
    id: ProviderKind,
    metadata: Option<DescriptorMetadata>,
    api: ApiConfig,
    models: Vec<ModelDescriptor>,
    cli: Option<CliConfig>,
}

impl ProviderDescriptorBuilder {
    /// Creates a new builder for the given provider.
    pub fn new(id: ProviderKind) -> Self {
        Self {
            id,
            metadata: None,
            api: ApiConfig::default(),
            models: Vec::new(),
            cli: None,
        }
    }

    /// Sets the metadata.
    pub fn metadata(mut self, metadata: DescriptorMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the API configuration.
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.api = api;
        self
    }

    /// Appends a candidate model. Call in fallback order.
    pub fn model(mut self, id: &str, label: &str) -> Self {
        self.models.push(ModelDescriptor::new(id, label));
        self
    }

    /// Sets the CLI configuration.
    pub fn cli(mut self, cli: CliConfig) -> Self {
        self.cli = Some(cli);
        self
    }

    /// Builds the descriptor.
    pub fn build(self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: self.id,
            metadata: self
                .metadata
                .unwrap_or_else(|| DescriptorMetadata::for_provider(self.id)),
            api: self.api,
            models: self.models,
            cli: self.cli.unwrap_or_else(|| CliConfig {
                name: self.id.cli_name(),
                aliases: &[],
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProviderDescriptor {
        ProviderDescriptor::builder(ProviderKind::Groq)
            .api(ApiConfig {
                base_url: "https://api.example.com/v1",
                ..ApiConfig::default()
            })
            .model("big", "Big")
            .model("small", "Small")
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let desc = sample();
        assert_eq!(desc.display_name(), "Groq");
        assert_eq!(desc.cli_name(), "groq");
        assert_eq!(desc.api.chat_path, "/chat/completions");
        assert_eq!(desc.models.len(), 2);
    }

    #[test]
    fn test_route_keeps_model_order() {
        let route = sample().route(None);
        assert_eq!(route.provider, ProviderKind::Groq);
        assert_eq!(route.base_url, "https://api.example.com/v1");
        let ids: Vec<_> = route.models.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["big", "small"]);
    }

    #[test]
    fn test_route_with_override() {
        let desc = sample();
        let route = desc.route(Some("http://127.0.0.1:9000/"));
        assert_eq!(route.base_url, "http://127.0.0.1:9000");

        // Blank overrides fall back to the default.
        assert_eq!(desc.base_url(Some("  ")), "https://api.example.com/v1");
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            endpoint("https://api.example.com/v1/", "/models"),
            "https://api.example.com/v1/models"
        );
    }
}
