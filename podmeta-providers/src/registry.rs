//! Provider registry for managing all provider descriptors.
//!
//! The registry provides static access to all provider configurations and
//! fixes the fallback order: Mistral first, then Groq.

use podmeta_core::{ProviderConfigSet, ProviderKind, ProviderRoute};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::descriptor::ProviderDescriptor;
use crate::groq::groq_descriptor;
use crate::mistral::mistral_descriptor;

// ============================================================================
// Static Registry
// ============================================================================

/// Static storage for all provider descriptors.
static DESCRIPTORS: OnceLock<Vec<ProviderDescriptor>> = OnceLock::new();

/// Static storage for CLI name to provider kind mapping.
static CLI_NAME_MAP: OnceLock<HashMap<String, ProviderKind>> = OnceLock::new();

/// Initializes all provider descriptors in fallback priority order.
fn init_descriptors() -> Vec<ProviderDescriptor> {
    vec![mistral_descriptor(), groq_descriptor()]
}

/// Builds the CLI name to provider kind mapping.
fn build_cli_name_map(descriptors: &[ProviderDescriptor]) -> HashMap<String, ProviderKind> {
    let mut map = HashMap::new();

    for desc in descriptors {
        map.insert(desc.cli.name.to_string(), desc.id);

        for alias in desc.cli.aliases {
            map.insert((*alias).to_string(), desc.id);
        }
    }

    map
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Global registry of all provider descriptors.
///
/// The registry is initialized lazily on first access and provides
/// thread-safe access to provider configurations.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Returns all provider descriptors, in fallback order.
    pub fn all() -> &'static [ProviderDescriptor] {
        DESCRIPTORS.get_or_init(init_descriptors)
    }

    /// Gets a provider descriptor by kind.
    pub fn get(id: ProviderKind) -> Option<&'static ProviderDescriptor> {
        Self::all().iter().find(|d| d.id == id)
    }

    /// Returns the CLI name to provider kind mapping.
    pub fn cli_name_map() -> &'static HashMap<String, ProviderKind> {
        CLI_NAME_MAP.get_or_init(|| build_cli_name_map(Self::all()))
    }

    /// Looks up a provider by CLI name or alias (case-insensitive).
    pub fn get_by_cli_name(name: &str) -> Option<&'static ProviderDescriptor> {
        let kind = Self::cli_name_map().get(&name.trim().to_lowercase())?;
        Self::get(*kind)
    }

    /// Returns the number of registered providers.
    pub fn count() -> usize {
        Self::all().len()
    }

    /// Returns all provider kinds.
    pub fn kinds() -> Vec<ProviderKind> {
        Self::all().iter().map(|d| d.id).collect()
    }

    /// Builds the ordered fallback plan, applying per-provider base URL
    /// overrides from `config`.
    pub fn routes(config: &ProviderConfigSet) -> Vec<ProviderRoute> {
        Self::all()
            .iter()
            .map(|d| {
                let override_url = config.get(d.id).and_then(|s| s.base_url.as_deref());
                d.route(override_url)
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use podmeta_core::ProviderSettings;

    #[test]
    fn test_registry_has_two_providers() {
        assert_eq!(ProviderRegistry::count(), 2);
        assert_eq!(ProviderRegistry::kinds(), vec![ProviderKind::Mistral, ProviderKind::Groq]);
    }

    #[test]
    fn test_registry_get_all_kinds() {
        for kind in ProviderKind::all() {
            let desc = ProviderRegistry::get(*kind);
            assert!(desc.is_some(), "Should find provider {kind:?}");
            assert_eq!(desc.unwrap().id, *kind);
        }
    }

    #[test]
    fn test_cli_name_lookup() {
        assert_eq!(
            ProviderRegistry::get_by_cli_name("mistral").unwrap().id,
            ProviderKind::Mistral
        );
        assert_eq!(ProviderRegistry::get_by_cli_name("GROQ").unwrap().id, ProviderKind::Groq);

        // Aliases
        assert_eq!(
            ProviderRegistry::get_by_cli_name("pixtral").unwrap().id,
            ProviderKind::Mistral
        );
        assert!(ProviderRegistry::get_by_cli_name("openai").is_none());
    }

    #[test]
    fn test_every_provider_has_models() {
        for desc in ProviderRegistry::all() {
            assert!(!desc.models.is_empty(), "{} has no models", desc.display_name());
            assert!(desc.api.base_url.starts_with("https://"));
        }
    }

    #[test]
    fn test_routes_default_order() {
        let routes = ProviderRegistry::routes(&ProviderConfigSet::new());
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].provider, ProviderKind::Mistral);
        assert_eq!(routes[0].base_url, "https://api.mistral.ai/v1");
        assert_eq!(routes[0].models[0].id, "pixtral-large-latest");
        assert_eq!(routes[1].provider, ProviderKind::Groq);
        assert_eq!(routes[1].base_url, "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_routes_apply_base_url_override() {
        let settings = ProviderSettings {
            base_url: Some("http://localhost:8080/v1".to_string()),
            ..ProviderSettings::default()
        };
        let config = ProviderConfigSet::new().with(ProviderKind::Groq, settings);

        let routes = ProviderRegistry::routes(&config);
        assert_eq!(routes[0].base_url, "https://api.mistral.ai/v1");
        assert_eq!(routes[1].base_url, "http://localhost:8080/v1");
    }
}
