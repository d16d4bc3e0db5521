//! User preferences store.
//!
//! Manages user settings with persistence.

use podmeta_core::{
    Marketplace, ProviderConfigSet, ProviderKind, ProviderSettings, ProviderStatus, StatusUpdate,
};
use podmeta_fetch::{FetchSettings, RetryStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Marketplace used when `--market` is not given.
    pub market: Marketplace,

    /// Per-provider activation, last status and base URL override.
    pub providers: ProviderConfigSet,

    /// Retries per model after the first attempt.
    pub max_retries: u32,

    /// Base backoff delay in milliseconds.
    pub backoff_base_ms: u64,

    /// Upper bound of the random jitter added to each backoff, in milliseconds.
    pub backoff_jitter_ms: u64,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout_secs: u64,

    /// Log level used when `--verbose` is not given.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        let mut providers = ProviderConfigSet::new();
        for kind in ProviderKind::all() {
            providers.insert(*kind, ProviderSettings::default());
        }

        Self {
            market: Marketplace::default(),
            providers,
            max_retries: 3,
            backoff_base_ms: 2_000,
            backoff_jitter_ms: 1_000,
            request_timeout_secs: 60,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Builds the retry policy from the backoff fields.
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.max_retries)
            .with_base_delay(Duration::from_millis(self.backoff_base_ms))
            .with_max_jitter(Duration::from_millis(self.backoff_jitter_ms))
    }

    /// Builds the fetch settings (timeout and retry policy).
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings::default()
            .with_timeout(Duration::from_secs(self.request_timeout_secs.max(1)))
            .with_retry(self.retry_strategy())
    }

    /// Returns a snapshot with an entry for every known provider.
    pub fn provider_config(&self) -> ProviderConfigSet {
        let mut config = self.providers.clone();
        for kind in ProviderKind::all() {
            config.entry(*kind);
        }
        config
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a new settings store with default settings.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path. A missing or corrupt file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self::with_settings(path, settings))
    }

    /// Returns the file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings in place.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings.write().await;
        f(&mut settings);
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    // ========================================================================
    // Marketplace
    // ========================================================================

    /// Gets the default marketplace.
    pub async fn market(&self) -> Marketplace {
        self.settings.read().await.market
    }

    /// Sets the default marketplace.
    pub async fn set_market(&self, market: Marketplace) {
        self.update(|s| s.market = market).await;
    }

    // ========================================================================
    // Provider Methods
    // ========================================================================

    /// Returns the settings of one provider.
    pub async fn provider(&self, kind: ProviderKind) -> ProviderSettings {
        self.settings
            .read()
            .await
            .providers
            .get(kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Activates or deactivates a provider.
    ///
    /// Deactivating marks the provider `Disabled`; reactivating clears the
    /// status back to `Active`.
    pub async fn set_provider_active(&self, kind: ProviderKind, active: bool) {
        self.update(|s| {
            let entry = s.providers.entry(kind);
            entry.is_active = active;
            entry.status = if active {
                ProviderStatus::Active
            } else {
                ProviderStatus::Disabled
            };
        })
        .await;
    }

    /// Records the last observed status of a provider.
    pub async fn set_provider_status(&self, kind: ProviderKind, status: ProviderStatus) {
        self.update(|s| s.providers.entry(kind).status = status).await;
    }

    /// Sets or clears a provider's base URL override.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL is not http(s).
    pub async fn set_base_url(
        &self,
        kind: ProviderKind,
        base_url: Option<String>,
    ) -> Result<(), StoreError> {
        let base_url = base_url.map(|u| u.trim().trim_end_matches('/').to_string());
        if let Some(url) = &base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(StoreError::Config(format!(
                    "base URL must start with http:// or https://: {url}"
                )));
            }
        }
        self.update(|s| s.providers.entry(kind).base_url = base_url).await;
        Ok(())
    }

    /// Applies status reports from a run, keeping disabled providers disabled.
    pub async fn apply_status_updates(&self, updates: &[StatusUpdate]) {
        if updates.is_empty() {
            return;
        }
        self.update(|s| {
            for update in updates {
                let entry = s.providers.entry(update.provider);
                if entry.is_active {
                    entry.status = update.status;
                }
            }
        })
        .await;
    }

    /// Clears `RateLimited` and `Error` statuses back to `Active`.
    ///
    /// Returns the providers that were reset.
    pub async fn reset_statuses(&self) -> Vec<ProviderKind> {
        let mut reset = Vec::new();
        self.update(|s| {
            for kind in ProviderKind::all() {
                let entry = s.providers.entry(*kind);
                if entry.is_active && entry.status.has_issues() {
                    entry.status = ProviderStatus::Active;
                    reset.push(*kind);
                }
            }
        })
        .await;
        reset
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        (dir, store)
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.market, Marketplace::Spreadshirt);
        assert_eq!(settings.providers.len(), 2);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.log_level, LogLevel::Warn);

        let retry = settings.retry_strategy();
        assert_eq!(retry.base_delay, Duration::from_secs(2));
        assert_eq!(retry.max_jitter, Duration::from_secs(1));
        assert_eq!(settings.fetch_settings().timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_provider_config_fills_missing_entries() {
        let settings = Settings {
            providers: ProviderConfigSet::new(),
            ..Settings::default()
        };
        let config = settings.provider_config();
        assert!(config.get(ProviderKind::Mistral).unwrap().is_active);
        assert!(config.get(ProviderKind::Groq).unwrap().is_active);
    }

    #[tokio::test]
    async fn test_disable_and_enable_provider() {
        let (_dir, store) = temp_store();

        store.set_provider_active(ProviderKind::Groq, false).await;
        let groq = store.provider(ProviderKind::Groq).await;
        assert!(!groq.is_active);
        assert_eq!(groq.status, ProviderStatus::Disabled);

        store.set_provider_active(ProviderKind::Groq, true).await;
        let groq = store.provider(ProviderKind::Groq).await;
        assert!(groq.is_active);
        assert_eq!(groq.status, ProviderStatus::Active);
    }

    #[tokio::test]
    async fn test_status_updates_skip_disabled() {
        let (_dir, store) = temp_store();
        store.set_provider_active(ProviderKind::Groq, false).await;

        store
            .apply_status_updates(&[
                StatusUpdate::new(ProviderKind::Mistral, ProviderStatus::RateLimited),
                StatusUpdate::new(ProviderKind::Groq, ProviderStatus::Error),
            ])
            .await;

        assert_eq!(
            store.provider(ProviderKind::Mistral).await.status,
            ProviderStatus::RateLimited
        );
        assert_eq!(
            store.provider(ProviderKind::Groq).await.status,
            ProviderStatus::Disabled
        );
    }

    #[tokio::test]
    async fn test_reset_statuses() {
        let (_dir, store) = temp_store();
        store
            .set_provider_status(ProviderKind::Mistral, ProviderStatus::RateLimited)
            .await;

        let reset = store.reset_statuses().await;
        assert_eq!(reset, vec![ProviderKind::Mistral]);
        assert_eq!(
            store.provider(ProviderKind::Mistral).await.status,
            ProviderStatus::Active
        );
        assert!(store.reset_statuses().await.is_empty());
    }

    #[tokio::test]
    async fn test_base_url_validation() {
        let (_dir, store) = temp_store();

        assert!(
            store
                .set_base_url(ProviderKind::Mistral, Some("ftp://example.com".into()))
                .await
                .is_err()
        );

        store
            .set_base_url(ProviderKind::Mistral, Some("http://localhost:8080/v1/".into()))
            .await
            .unwrap();
        assert_eq!(
            store.provider(ProviderKind::Mistral).await.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );

        store.set_base_url(ProviderKind::Mistral, None).await.unwrap();
        assert!(store.provider(ProviderKind::Mistral).await.base_url.is_none());
    }

    #[tokio::test]
    async fn test_update_visible_to_readers() {
        let (_dir, store) = temp_store();

        store.set_market(Marketplace::Zazzle).await;

        assert_eq!(store.market().await, Marketplace::Zazzle);
        assert_eq!(store.get().await.market, Marketplace::Zazzle);
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }
}
