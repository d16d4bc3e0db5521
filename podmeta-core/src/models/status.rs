//! Provider health types.
//!
//! - [`ProviderStatus`] - Health levels reported back to the UI layer
//! - [`StatusUpdate`] - A timestamped status report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::provider::ProviderKind;

// ============================================================================
// Provider Status
// ============================================================================

/// Per-provider health as last observed by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderStatus {
    /// Last request succeeded (or never tried).
    #[default]
    Active,
    /// Retries were exhausted on HTTP 429.
    RateLimited,
    /// Last request failed for any other reason.
    Error,
    /// Turned off by the user.
    Disabled,
}

impl ProviderStatus {
    /// Returns a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::RateLimited => "Rate limited",
            Self::Error => "Error",
            Self::Disabled => "Disabled",
        }
    }

    /// Returns an emoji for the status.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Active => "🟢",
            Self::RateLimited => "🟡",
            Self::Error => "🔴",
            Self::Disabled => "⚪",
        }
    }

    /// Returns true if this status indicates a problem.
    pub fn has_issues(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Error)
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Status Update
// ============================================================================

/// A single status report for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Provider the report is about.
    pub provider: ProviderKind,
    /// New status.
    pub status: ProviderStatus,
    /// Failure message, when the status came from an error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When the report was made.
    pub updated_at: DateTime<Utc>,
}

impl StatusUpdate {
    /// Creates a status update stamped with the current time.
    pub fn new(provider: ProviderKind, status: ProviderStatus) -> Self {
        Self {
            provider,
            status,
            message: None,
            updated_at: Utc::now(),
        }
    }

    /// Attaches a failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
