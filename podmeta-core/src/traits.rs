//! Trait definitions for Podmeta.

use crate::models::StatusUpdate;

/// Receives per-provider health updates from the orchestrator.
///
/// Implemented for any `Fn(StatusUpdate)` closure, so a caller can pass a
/// plain callback.
pub trait StatusReporter: Send + Sync {
    /// Records a status change for one provider.
    fn report(&self, update: StatusUpdate);
}

impl<F> StatusReporter for F
where
    F: Fn(StatusUpdate) + Send + Sync,
{
    fn report(&self, update: StatusUpdate) {
        self(update);
    }
}

/// A reporter that discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl StatusReporter for NoopReporter {
    fn report(&self, _update: StatusUpdate) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProviderKind, ProviderStatus};
    use std::sync::Mutex;

    #[test]
    fn test_closure_reporter() {
        let seen = Mutex::new(Vec::new());
        let reporter = |update: StatusUpdate| seen.lock().unwrap().push(update.status);
        reporter.report(StatusUpdate::new(ProviderKind::Groq, ProviderStatus::Error));
        assert_eq!(*seen.lock().unwrap(), vec![ProviderStatus::Error]);
    }
}
