//! Bulk generation queue.
//!
//! Every input file becomes a [`QueueItem`] that moves through
//! `pending -> processing -> completed | error`. The generate command walks
//! the runnable items one at a time so per-key rate limits hold.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use podmeta_core::{ImageMime, ImagePayload};
use podmeta_fetch::{ErrorKind, FetchError, GeneratedMetadata};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Item Status
// ============================================================================

/// Where an item is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Waiting to be processed.
    Pending,
    /// Request in flight.
    Processing,
    /// Metadata generated.
    Completed,
    /// Failed. See [`QueueItem::error`].
    Error,
}

impl ItemStatus {
    /// Returns a short label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Item Error
// ============================================================================

/// Why an item failed.
#[derive(Debug, Error)]
pub enum ItemError {
    /// Extension is not a supported image type. Never sent to a provider.
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    /// The file could not be read.
    #[error("Cannot read image: {0}")]
    Read(String),

    /// Every provider failed.
    #[error(transparent)]
    Generation(#[from] FetchError),
}

impl ItemError {
    /// Returns a user-facing hint.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Unsupported(_) => Some("Supported formats: png, jpg, jpeg, webp, gif."),
            Self::Read(_) => None,
            Self::Generation(e) => e.user_hint(),
        }
    }

    /// Returns the error classification for generation failures.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Generation(e) => Some(e.kind()),
            _ => None,
        }
    }
}

// ============================================================================
// Queue Item
// ============================================================================

/// One image in the batch.
#[derive(Debug)]
pub struct QueueItem {
    /// Source file.
    pub path: PathBuf,
    /// Lifecycle state.
    pub status: ItemStatus,
    /// MIME type guessed from the extension.
    pub mime: Option<ImageMime>,
    /// Result of the last successful run.
    pub result: Option<GeneratedMetadata>,
    /// Error of the last failed run.
    pub error: Option<ItemError>,
}

impl QueueItem {
    /// Creates an item. Unsupported extensions start out as errors.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageMime::from_extension);

        let mut item = Self {
            path,
            status: ItemStatus::Pending,
            mime,
            result: None,
            error: None,
        };

        if mime.is_none() {
            let ext = item
                .path
                .extension()
                .map_or_else(|| "(none)".to_string(), |e| e.to_string_lossy().into_owned());
            item.fail(ItemError::Unsupported(ext));
        }
        item
    }

    /// Returns the file name for display.
    pub fn file_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }

    /// Returns true if the item should be sent on the next run.
    ///
    /// Pending items and items that failed at read or generation time are
    /// runnable. Unsupported files never are.
    pub fn is_runnable(&self) -> bool {
        match self.status {
            ItemStatus::Pending => true,
            ItemStatus::Error => !matches!(self.error, Some(ItemError::Unsupported(_))),
            ItemStatus::Processing | ItemStatus::Completed => false,
        }
    }

    /// Moves a runnable item to `Processing`. Returns false otherwise.
    pub fn start(&mut self) -> bool {
        if !self.is_runnable() {
            return false;
        }
        self.status = ItemStatus::Processing;
        self.error = None;
        self.result = None;
        true
    }

    /// Marks the item completed.
    pub fn complete(&mut self, generated: GeneratedMetadata) {
        self.status = ItemStatus::Completed;
        self.result = Some(generated);
        self.error = None;
    }

    /// Marks the item failed.
    pub fn fail(&mut self, error: ItemError) {
        debug!(file = %self.path.display(), error = %error, "Item failed");
        self.status = ItemStatus::Error;
        self.result = None;
        self.error = Some(error);
    }

    /// Puts an interrupted item back in the queue.
    pub fn requeue(&mut self) {
        if self.status == ItemStatus::Processing {
            self.status = ItemStatus::Pending;
        }
    }

    /// Reads the file and encodes it for the request.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::Unsupported`] for unknown extensions and
    /// [`ItemError::Read`] if the file cannot be read.
    pub async fn load(&self) -> Result<ImagePayload, ItemError> {
        let mime = self
            .mime
            .ok_or_else(|| ItemError::Unsupported(self.file_name()))?;
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ItemError::Read(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ItemError::Read("file is empty".to_string()));
        }
        ImagePayload::new(STANDARD.encode(&bytes), mime.as_str())
            .map_err(|e| ItemError::Read(e.to_string()))
    }
}

// ============================================================================
// Batch Queue
// ============================================================================

/// Ordered collection of items.
#[derive(Debug, Default)]
pub struct BatchQueue {
    items: Vec<QueueItem>,
}

impl BatchQueue {
    /// Creates a queue with one item per path, in order.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Self {
        Self {
            items: paths.iter().map(|p| QueueItem::new(p.as_ref())).collect(),
        }
    }

    /// Returns all items.
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    /// Returns an item for mutation.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut QueueItem> {
        self.items.get_mut(index)
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the queue has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Indices of items the next run will process, in queue order.
    pub fn runnable(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_runnable())
            .map(|(i, _)| i)
            .collect()
    }

    /// Counts items by state.
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.items.len(),
            ..BatchSummary::default()
        };
        for item in &self.items {
            match item.status {
                ItemStatus::Completed => {
                    summary.completed += 1;
                    if let Some(generated) = &item.result {
                        *summary
                            .by_provider
                            .entry(generated.provider.cli_name().to_string())
                            .or_default() += 1;
                    }
                }
                ItemStatus::Error => summary.failed += 1,
                ItemStatus::Pending | ItemStatus::Processing => summary.pending += 1,
            }
        }
        summary
    }
}

/// Per-run counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Items in the queue.
    pub total: usize,
    /// Items with metadata.
    pub completed: usize,
    /// Items that failed.
    pub failed: usize,
    /// Items not yet processed.
    pub pending: usize,
    /// Completed items per provider CLI name.
    pub by_provider: BTreeMap<String, usize>,
}

// ============================================================================
// Tests
// ============================================================================
