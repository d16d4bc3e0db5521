//! Provider-related types.
//!
//! This module contains types related to vision providers:
//! - [`ProviderKind`] - Enum of supported providers
//! - [`ProviderSettings`] - Per-provider configuration owned by the settings layer
//! - [`ProviderConfigSet`] - Read-only snapshot handed to the orchestrator per call

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::status::ProviderStatus;

// ============================================================================
// Provider Kind
// ============================================================================

/// Supported vision provider kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Mistral AI (Pixtral vision models).
    Mistral,
    /// Groq LPU inference (Llama vision models).
    Groq,
}

impl ProviderKind {
    /// Returns the display name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Mistral => "Mistral",
            Self::Groq => "Groq",
        }
    }

    /// Returns all available provider kinds.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::Mistral, Self::Groq]
    }

    /// Returns the CLI name for this provider (lowercase, no spaces).
    pub fn cli_name(&self) -> &'static str {
        match self {
            Self::Mistral => "mistral",
            Self::Groq => "groq",
        }
    }

    /// Looks up a provider by its CLI name (case-insensitive).
    pub fn from_cli_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.cli_name().eq_ignore_ascii_case(name))
    }

    /// Environment variable that may carry an API key for this provider.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Mistral => "MISTRAL_API_KEY",
            Self::Groq => "GROQ_API_KEY",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// Provider Settings
// ============================================================================

/// Configuration for a specific provider.
///
/// `status` is advisory telemetry; only `is_active` and the presence of a
/// credential gate eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderSettings {
    /// Manual activation flag.
    pub is_active: bool,
    /// Last known health reported by the orchestrator.
    pub status: ProviderStatus,
    /// API key resolved at runtime. Never written to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Overrides the provider's API base URL (proxies, tests).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            is_active: true,
            status: ProviderStatus::Active,
            api_key: None,
            base_url: None,
        }
    }
}

impl ProviderSettings {
    /// Creates active settings carrying the given key.
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Returns the API key if one is present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

// ============================================================================
// Provider Config Set
// ============================================================================

/// Snapshot of every provider's settings, passed into one orchestrator call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderConfigSet {
    providers: HashMap<ProviderKind, ProviderSettings>,
}

impl ProviderConfigSet {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces settings for a provider.
    pub fn with(mut self, kind: ProviderKind, settings: ProviderSettings) -> Self {
        self.providers.insert(kind, settings);
        self
    }

    /// Adds or replaces settings for a provider in place.
    pub fn insert(&mut self, kind: ProviderKind, settings: ProviderSettings) {
        self.providers.insert(kind, settings);
    }

    /// Returns settings for a provider.
    pub fn get(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.get(&kind)
    }

    /// Returns mutable settings for a provider, inserting defaults if absent.
    pub fn entry(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        self.providers.entry(kind).or_default()
    }

    /// Iterates over configured providers.
    pub fn iter(&self) -> impl Iterator<Item = (&ProviderKind, &ProviderSettings)> {
        self.providers.iter()
    }

    /// Returns the number of configured providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider is configured.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_display_name() {
        assert_eq!(ProviderKind::Mistral.display_name(), "Mistral");
        assert_eq!(ProviderKind::Groq.to_string(), "Groq");
    }

    #[test]
    fn test_from_cli_name() {
        assert_eq!(ProviderKind::from_cli_name("groq"), Some(ProviderKind::Groq));
        assert_eq!(ProviderKind::from_cli_name(" Mistral "), Some(ProviderKind::Mistral));
        assert_eq!(ProviderKind::from_cli_name("gemini"), None);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let settings = ProviderSettings::with_key("   ");
        assert!(settings.api_key().is_none());

        let settings = ProviderSettings::with_key("gsk_123");
        assert_eq!(settings.api_key(), Some("gsk_123"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let settings = ProviderSettings::with_key("secret");
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("isActive"));
    }
}
