//! Live provider status for a batch run.
//!
//! [`StatusBoard`] is the [`StatusReporter`] handed to the pipeline. It keeps
//! the latest update per provider so later items in a batch see statuses
//! reported by earlier ones.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use podmeta_core::{ProviderConfigSet, ProviderKind, StatusReporter, StatusUpdate};
use tracing::debug;

/// Latest status per provider.
pub struct StatusBoard {
    latest: Mutex<HashMap<ProviderKind, StatusUpdate>>,
}

impl StatusBoard {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProviderKind, StatusUpdate>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the latest update for a provider.
    pub fn latest(&self, provider: ProviderKind) -> Option<StatusUpdate> {
        self.lock().get(&provider).cloned()
    }

    /// Returns every provider's latest update, in provider priority order.
    pub fn snapshot(&self) -> Vec<StatusUpdate> {
        let latest = self.lock();
        ProviderKind::all()
            .iter()
            .filter_map(|kind| latest.get(kind).cloned())
            .collect()
    }

    /// Copies the reported statuses into a config snapshot.
    pub fn apply_to(&self, config: &mut ProviderConfigSet) {
        for update in self.lock().values() {
            config.entry(update.provider).status = update.status;
        }
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter for StatusBoard {
    fn report(&self, update: StatusUpdate) {
        debug!(provider = %update.provider, status = %update.status, "Provider status");
        self.lock().insert(update.provider, update);
    }
}

impl std::fmt::Debug for StatusBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusBoard")
            .field("providers", &self.lock().len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use podmeta_core::ProviderStatus;

    #[test]
    fn test_latest_update_wins() {
        let board = StatusBoard::new();
        board.report(StatusUpdate::new(ProviderKind::Groq, ProviderStatus::RateLimited));
        board.report(StatusUpdate::new(ProviderKind::Groq, ProviderStatus::Active));

        assert_eq!(
            board.latest(ProviderKind::Groq).unwrap().status,
            ProviderStatus::Active
        );
        assert!(board.latest(ProviderKind::Mistral).is_none());
    }

    #[test]
    fn test_snapshot_in_priority_order() {
        let board = StatusBoard::new();
        board.report(StatusUpdate::new(ProviderKind::Groq, ProviderStatus::Active));
        board.report(StatusUpdate::new(ProviderKind::Mistral, ProviderStatus::Error));

        let providers: Vec<_> = board.snapshot().iter().map(|u| u.provider).collect();
        assert_eq!(providers, vec![ProviderKind::Mistral, ProviderKind::Groq]);
    }

    #[test]
    fn test_apply_to_config() {
        let board = StatusBoard::new();
        board.report(StatusUpdate::new(ProviderKind::Mistral, ProviderStatus::RateLimited));

        let mut config = ProviderConfigSet::new();
        board.apply_to(&mut config);
        assert_eq!(
            config.get(ProviderKind::Mistral).unwrap().status,
            ProviderStatus::RateLimited
        );
        assert!(config.get(ProviderKind::Groq).is_none());
    }

    #[test]
    fn test_usable_as_dyn_reporter() {
        let board = StatusBoard::new();
        let reporter: &dyn StatusReporter = &board;
        reporter.report(StatusUpdate::new(ProviderKind::Groq, ProviderStatus::Error));
        assert_eq!(board.snapshot().len(), 1);
    }
}
