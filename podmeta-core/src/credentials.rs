//! Credential pool with round-robin rotation.
//!
//! The rotation cursor is owned by the pool and guarded by a mutex; callers
//! only ever ask for the next credential.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::ProviderKind;

#[derive(Default)]
struct PoolState {
    keys: HashMap<ProviderKind, Vec<String>>,
    cursors: HashMap<ProviderKind, usize>,
}

/// A set of API keys per provider, rotated round-robin.
#[derive(Default)]
pub struct CredentialPool {
    state: Mutex<PoolState>,
}

impl CredentialPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool from existing key lists. Blank and duplicate keys are dropped.
    pub fn from_keys(keys: HashMap<ProviderKind, Vec<String>>) -> Self {
        let pool = Self::new();
        for (provider, list) in keys {
            for key in list {
                pool.add(provider, key);
            }
        }
        pool
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the next key for a provider and advances its cursor.
    pub fn next_credential(&self, provider: ProviderKind) -> Option<String> {
        let mut state = self.lock();
        let len = state.keys.get(&provider).map_or(0, Vec::len);
        if len == 0 {
            return None;
        }
        let cursor = state.cursors.entry(provider).or_insert(0);
        let index = *cursor % len;
        *cursor = cursor.wrapping_add(1);
        state.keys.get(&provider).and_then(|keys| keys.get(index)).cloned()
    }

    /// Adds a key. Returns false if it is blank or already present.
    pub fn add(&self, provider: ProviderKind, key: impl Into<String>) -> bool {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return false;
        }
        let mut state = self.lock();
        let keys = state.keys.entry(provider).or_default();
        if keys.contains(&key) {
            return false;
        }
        keys.push(key);
        true
    }

    /// Removes a key. Returns false if it was not present.
    pub fn remove(&self, provider: ProviderKind, key: &str) -> bool {
        let mut state = self.lock();
        let Some(keys) = state.keys.get_mut(&provider) else {
            return false;
        };
        let before = keys.len();
        keys.retain(|k| k != key);
        before != keys.len()
    }

    /// Returns a copy of a provider's keys, in rotation order.
    pub fn keys(&self, provider: ProviderKind) -> Vec<String> {
        self.lock().keys.get(&provider).cloned().unwrap_or_default()
    }

    /// Returns the number of keys for a provider.
    pub fn len(&self, provider: ProviderKind) -> usize {
        self.lock().keys.get(&provider).map_or(0, Vec::len)
    }

    /// Returns true if a provider has no keys.
    pub fn is_empty(&self, provider: ProviderKind) -> bool {
        self.len(provider) == 0
    }

    /// Returns a copy of every key list.
    pub fn snapshot(&self) -> HashMap<ProviderKind, Vec<String>> {
        self.lock().keys.clone()
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        let counts: HashMap<_, _> = state.keys.iter().map(|(p, k)| (*p, k.len())).collect();
        f.debug_struct("CredentialPool").field("keys", &counts).finish()
    }
}

/// Masks an API key for display, keeping a short prefix and suffix.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "•".repeat(chars.len().max(4));
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
