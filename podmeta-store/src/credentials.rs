//! API key resolution.
//!
//! Each provider's key is looked up in order:
//!
//! 1. **Environment** - `MISTRAL_API_KEY` / `GROQ_API_KEY`
//! 2. **Keychain** - service `podmeta:<provider>`, account `api_key`
//! 3. **Key pool** - the first pooled key
//!
//! The resolved key fills [`ProviderSettings::api_key`]; the pool itself is
//! still handed to the pipeline for rotation.

use std::fmt;
use std::sync::Arc;

use podmeta_core::{CredentialPool, ProviderConfigSet, ProviderKind, mask_key};
use podmeta_fetch::host::keychain::accounts;
use podmeta_fetch::{KeychainApi, SystemKeychain};
use tracing::{debug, instrument, warn};

use crate::error::StoreError;

/// Where a key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Environment variable.
    Env,
    /// System keychain.
    Keychain,
    /// Key pool file.
    Pool,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Env => write!(f, "env"),
            KeySource::Keychain => write!(f, "keychain"),
            KeySource::Pool => write!(f, "pool"),
        }
    }
}

/// A key and its origin.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// The key.
    pub key: String,
    /// Where it came from.
    pub source: KeySource,
}

impl fmt::Debug for ResolvedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedKey")
            .field("key", &mask_key(&self.key))
            .field("source", &self.source)
            .finish()
    }
}

type EnvLookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Resolves provider keys from the environment, the keychain and the pool.
pub struct CredentialStore {
    keychain: Arc<dyn KeychainApi>,
    env: EnvLookup,
}

impl CredentialStore {
    /// Creates a store backed by the system keychain and process environment.
    pub fn new() -> Self {
        Self::with_keychain(Arc::new(SystemKeychain::new()))
    }

    /// Creates a store backed by the given keychain.
    pub fn with_keychain(keychain: Arc<dyn KeychainApi>) -> Self {
        Self {
            keychain,
            env: process_env,
        }
    }

    /// Replaces the environment lookup.
    pub fn with_env_lookup(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    /// Resolves the key for one provider.
    #[instrument(skip(self, pool), fields(provider = %provider))]
    pub async fn resolve(&self, provider: ProviderKind, pool: &CredentialPool) -> Option<ResolvedKey> {
        if let Some(key) = (self.env)(provider.api_key_env()).filter(|k| !k.trim().is_empty()) {
            debug!(source = "env", "Resolved API key");
            return Some(ResolvedKey {
                key: key.trim().to_string(),
                source: KeySource::Env,
            });
        }

        match self.keychain.get(provider.cli_name(), accounts::API_KEY).await {
            Ok(Some(key)) if !key.trim().is_empty() => {
                debug!(source = "keychain", "Resolved API key");
                return Some(ResolvedKey {
                    key: key.trim().to_string(),
                    source: KeySource::Keychain,
                });
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Keychain lookup failed"),
        }

        let key = pool.keys(provider).into_iter().next()?;
        debug!(source = "pool", "Resolved API key");
        Some(ResolvedKey {
            key,
            source: KeySource::Pool,
        })
    }

    /// Fills `api_key` for every provider in `config`.
    pub async fn resolve_into(&self, config: &mut ProviderConfigSet, pool: &CredentialPool) {
        for kind in ProviderKind::all() {
            let resolved = self.resolve(*kind, pool).await;
            config.entry(*kind).api_key = resolved.map(|r| r.key);
        }
    }

    /// Stores a key in the keychain.
    ///
    /// # Errors
    ///
    /// Returns error if the keychain rejects the write.
    pub async fn store_in_keychain(&self, provider: ProviderKind, key: &str) -> Result<(), StoreError> {
        self.keychain
            .set(provider.cli_name(), accounts::API_KEY, key.trim())
            .await?;
        debug!(provider = %provider, key = %mask_key(key), "Stored key in keychain");
        Ok(())
    }

    /// Deletes the keychain entry for a provider.
    ///
    /// # Errors
    ///
    /// Returns error if the keychain rejects the delete.
    pub async fn delete_from_keychain(&self, provider: ProviderKind) -> Result<(), StoreError> {
        self.keychain.delete(provider.cli_name(), accounts::API_KEY).await?;
        Ok(())
    }

    /// Returns the keychain entry for a provider, if any.
    pub async fn keychain_key(&self, provider: ProviderKind) -> Option<String> {
        self.keychain
            .get(provider.cli_name(), accounts::API_KEY)
            .await
            .ok()
            .flatten()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use podmeta_fetch::MemoryKeychain;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn groq_env(name: &str) -> Option<String> {
        (name == "GROQ_API_KEY").then(|| " gsk_from_env ".to_string())
    }

    fn store() -> CredentialStore {
        CredentialStore::with_keychain(Arc::new(MemoryKeychain::new())).with_env_lookup(no_env)
    }

    #[tokio::test]
    async fn test_nothing_configured() {
        let pool = CredentialPool::new();
        assert!(store().resolve(ProviderKind::Mistral, &pool).await.is_none());
    }

    #[tokio::test]
    async fn test_pool_fallback() {
        let pool = CredentialPool::new();
        pool.add(ProviderKind::Mistral, "pool-first");
        pool.add(ProviderKind::Mistral, "pool-second");

        let resolved = store().resolve(ProviderKind::Mistral, &pool).await.unwrap();
        assert_eq!(resolved.key, "pool-first");
        assert_eq!(resolved.source, KeySource::Pool);

        // Resolution does not advance the rotation cursor.
        assert_eq!(pool.next_credential(ProviderKind::Mistral).as_deref(), Some("pool-first"));
    }

    #[tokio::test]
    async fn test_keychain_beats_pool() {
        let store = store();
        let pool = CredentialPool::new();
        pool.add(ProviderKind::Groq, "gsk_pool");
        store.store_in_keychain(ProviderKind::Groq, "gsk_keychain").await.unwrap();

        let resolved = store.resolve(ProviderKind::Groq, &pool).await.unwrap();
        assert_eq!(resolved.key, "gsk_keychain");
        assert_eq!(resolved.source, KeySource::Keychain);

        store.delete_from_keychain(ProviderKind::Groq).await.unwrap();
        assert!(store.keychain_key(ProviderKind::Groq).await.is_none());
        assert_eq!(store.resolve(ProviderKind::Groq, &pool).await.unwrap().source, KeySource::Pool);
    }

    #[tokio::test]
    async fn test_env_beats_keychain() {
        let store = store().with_env_lookup(groq_env);
        store.store_in_keychain(ProviderKind::Groq, "gsk_keychain").await.unwrap();

        let resolved = store.resolve(ProviderKind::Groq, &CredentialPool::new()).await.unwrap();
        assert_eq!(resolved.key, "gsk_from_env");
        assert_eq!(resolved.source, KeySource::Env);
    }

    #[tokio::test]
    async fn test_resolve_into_config() {
        let store = store().with_env_lookup(groq_env);
        let mut config = ProviderConfigSet::new();

        store.resolve_into(&mut config, &CredentialPool::new()).await;

        assert_eq!(config.get(ProviderKind::Groq).unwrap().api_key(), Some("gsk_from_env"));
        assert!(config.get(ProviderKind::Mistral).unwrap().api_key().is_none());
    }

    #[test]
    fn test_resolved_key_debug_is_masked() {
        let resolved = ResolvedKey {
            key: "gsk_abcdefghijklmnop".to_string(),
            source: KeySource::Env,
        };
        let debug = format!("{resolved:?}");
        assert!(!debug.contains("abcdefghijkl"));
    }
}
