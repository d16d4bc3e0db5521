//! JSON output formatting.

use anyhow::Result;
use podmeta_core::{Marketplace, ProviderSettings, ProviderStatus, StatusUpdate, mask_key};
use podmeta_fetch::{ErrorKind, FetchError};
use podmeta_providers::ProviderDescriptor;
use serde::Serialize;

use crate::queue::{BatchSummary, ItemStatus, QueueItem};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one queue item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutput {
    pub file: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl From<&QueueItem> for ItemOutput {
    fn from(item: &QueueItem) -> Self {
        let generated = item.result.as_ref();
        Self {
            file: item.path.display().to_string(),
            status: item.status,
            provider: generated.map(|g| g.provider.cli_name().to_string()),
            model: generated.map(|g| g.model.clone()),
            title: generated.map(|g| g.metadata.title.clone()),
            description: generated.map(|g| g.metadata.description.clone()),
            tags: generated.map(|g| g.metadata.tags.clone()),
            main_tag: generated.and_then(|g| g.metadata.main_tag.clone()),
            error: item.error.as_ref().map(ToString::to_string),
            error_kind: item.error.as_ref().and_then(|e| e.kind()),
            hint: item.error.as_ref().and_then(|e| e.hint()).map(str::to_string),
        }
    }
}

/// JSON output for a generate run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutput {
    pub market: Marketplace,
    pub items: Vec<ItemOutput>,
    pub summary: BatchSummary,
    pub provider_status: Vec<StatusUpdate>,
}

/// JSON output for one provider.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOutput {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub active: bool,
    pub status: ProviderStatus,
    pub base_url: String,
    pub models: Vec<String>,
    pub pool_keys: usize,
    pub console_url: String,
}

/// JSON output for one provider's keys. Keys are masked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysOutput {
    pub provider: String,
    pub pool: Vec<String>,
    pub keychain: bool,
    pub env: bool,
}

/// JSON output for one key validation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutput {
    pub provider: String,
    pub key: String,
    pub source: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ValidationOutput {
    /// Builds the output for one probe result.
    pub fn new(
        desc: &ProviderDescriptor,
        key: &str,
        source: &str,
        result: &Result<(), FetchError>,
    ) -> Self {
        Self {
            provider: desc.cli_name().to_string(),
            key: mask_key(key),
            source: source.to_string(),
            valid: result.is_ok(),
            error: result.as_ref().err().map(ToString::to_string),
            error_kind: result.as_ref().err().map(FetchError::kind),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(data)?)
        } else {
            Ok(serde_json::to_string(data)?)
        }
    }

    /// Formats a generate run.
    pub fn format_generate(
        &self,
        market: Marketplace,
        items: &[QueueItem],
        summary: BatchSummary,
        provider_status: Vec<StatusUpdate>,
    ) -> Result<String> {
        let output = GenerateOutput {
            market,
            items: items.iter().map(ItemOutput::from).collect(),
            summary,
            provider_status,
        };
        self.format(&output)
    }

    /// Formats the provider list.
    pub fn format_providers(
        &self,
        providers: &[(&ProviderDescriptor, ProviderSettings, usize)],
    ) -> Result<String> {
        let output: Vec<ProviderOutput> = providers
            .iter()
            .map(|(desc, settings, key_count)| ProviderOutput {
                id: desc.cli_name().to_string(),
                name: desc.display_name().to_string(),
                aliases: desc.cli.aliases.iter().map(|a| (*a).to_string()).collect(),
                active: settings.is_active,
                status: settings.status,
                base_url: desc.base_url(settings.base_url.as_deref()).to_string(),
                models: desc.models.iter().map(|m| m.id.clone()).collect(),
                pool_keys: *key_count,
                console_url: desc.metadata.console_url.to_string(),
            })
            .collect();
        self.format(&output)
    }
}

// ============================================================================
// Tests
// ============================================================================
