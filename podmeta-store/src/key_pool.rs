//! Key pool persistence.
//!
//! The pool file keeps one list of API keys per provider:
//!
//! ```json
//! { "mistral": ["..."], "groq": ["gsk_...", "gsk_..."] }
//! ```
//!
//! Unknown providers, non-string entries and unparseable files are ignored,
//! so a damaged file loads as an empty pool instead of failing the run.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use podmeta_core::{CredentialPool, ProviderKind};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_key_pool_path, save_json};

/// Reads and writes the key pool file.
#[derive(Debug, Clone)]
pub struct KeyPoolStore {
    path: PathBuf,
}

impl KeyPoolStore {
    /// Creates a store for the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a store for the default file.
    pub fn default_location() -> Self {
        Self::new(default_key_pool_path())
    }

    /// Returns the file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the pool. Missing or malformed content yields an empty pool.
    pub async fn load(&self) -> CredentialPool {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No key pool file");
                return CredentialPool::new();
            }
        };

        let keys = parse_pool(&content);
        debug!(
            path = %self.path.display(),
            providers = keys.len(),
            "Key pool loaded"
        );
        CredentialPool::from_keys(keys)
    }

    /// Writes the pool to disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub async fn save(&self, pool: &CredentialPool) -> Result<(), StoreError> {
        let snapshot = pool.snapshot();
        let file: BTreeMap<&str, Vec<String>> = ProviderKind::all()
            .iter()
            .map(|kind| (kind.cli_name(), snapshot.get(kind).cloned().unwrap_or_default()))
            .collect();

        save_json(&self.path, &file).await?;
        info!(path = %self.path.display(), "Key pool saved");
        Ok(())
    }

    /// Adds a key and persists the pool. Returns false for blanks and duplicates.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub async fn add(&self, provider: ProviderKind, key: &str) -> Result<bool, StoreError> {
        let pool = self.load().await;
        if !pool.add(provider, key) {
            return Ok(false);
        }
        self.save(&pool).await?;
        Ok(true)
    }

    /// Removes a key and persists the pool. Returns false if it was absent.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written.
    pub async fn remove(&self, provider: ProviderKind, key: &str) -> Result<bool, StoreError> {
        let pool = self.load().await;
        if !pool.remove(provider, key) {
            return Ok(false);
        }
        self.save(&pool).await?;
        Ok(true)
    }
}

/// Parses pool file content leniently.
fn parse_pool(content: &str) -> HashMap<ProviderKind, Vec<String>> {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Key pool file is not valid JSON, ignoring it");
            return HashMap::new();
        }
    };

    let Value::Object(map) = value else {
        warn!("Key pool file is not a JSON object, ignoring it");
        return HashMap::new();
    };

    map.into_iter()
        .filter_map(|(name, keys)| {
            let kind = ProviderKind::from_cli_name(&name)?;
            let keys = match keys {
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|k| k.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            Some((kind, keys))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
