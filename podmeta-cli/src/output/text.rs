//! Text output formatting with colors.

use podmeta_core::{Marketplace, ProviderSettings, ProviderStatus, StatusUpdate, mask_key};
use podmeta_fetch::FetchError;
use podmeta_providers::ProviderDescriptor;

use crate::queue::{BatchSummary, ItemStatus, QueueItem};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 20,
        }
    }

    // ========================================================================
    // Generate
    // ========================================================================

    /// Formats the "working on" line for one item.
    pub fn format_progress(&self, position: usize, total: usize, item: &QueueItem) -> String {
        format!(
            "{} {} {}",
            self.progress_bar(position.saturating_sub(1), total),
            self.dim(&format!("[{position}/{total}]")),
            item.file_name()
        )
    }

    /// Formats a finished item.
    pub fn format_item(&self, item: &QueueItem, market: Marketplace) -> String {
        let name = self.bold(&item.file_name());
        match item.status {
            ItemStatus::Completed => match &item.result {
                Some(generated) => {
                    let meta = &generated.metadata;
                    let mut lines = vec![format!(
                        "{} {} {}",
                        self.green("✓"),
                        name,
                        self.dim(&format!("({} · {})", generated.provider, generated.model))
                    )];
                    lines.push(format!("  Title:       {}", meta.title));
                    lines.push(format!("  Description: {}", meta.description));
                    if market.constraints().requests_main_tag {
                        let main_tag = meta.main_tag.as_deref().unwrap_or("-");
                        lines.push(format!("  Main tag:    {}", self.cyan(main_tag)));
                    }
                    lines.push(format!(
                        "  {:<13}{}",
                        format!("Tags ({}):", meta.tags.len()),
                        meta.tags_joined()
                    ));
                    lines.join("\n")
                }
                None => format!("{} {}", self.green("✓"), name),
            },
            ItemStatus::Error => {
                let message = item
                    .error
                    .as_ref()
                    .map_or_else(|| "failed".to_string(), ToString::to_string);
                let mut out = format!("{} {} {}", self.red("✗"), name, message);
                if let Some(hint) = item.error.as_ref().and_then(|e| e.hint()) {
                    out.push_str(&format!("\n  {}", self.dim(hint)));
                }
                out
            }
            ItemStatus::Pending | ItemStatus::Processing => {
                format!("{} {} {}", self.dim("•"), name, self.dim(item.status.label()))
            }
        }
    }

    /// Formats the per-run summary line.
    pub fn format_summary(&self, summary: &BatchSummary) -> String {
        let mut out = format!(
            "{} {} completed, {} failed",
            self.bold("Done:"),
            self.green(&summary.completed.to_string()),
            if summary.failed > 0 {
                self.red(&summary.failed.to_string())
            } else {
                summary.failed.to_string()
            }
        );
        if summary.pending > 0 {
            out.push_str(&format!(", {} pending", self.yellow(&summary.pending.to_string())));
        }
        if !summary.by_provider.is_empty() {
            let providers: Vec<String> = summary
                .by_provider
                .iter()
                .map(|(name, count)| format!("{name}: {count}"))
                .collect();
            out.push_str(&format!(" {}", self.dim(&format!("({})", providers.join(", ")))));
        }
        out
    }

    /// Formats a provider status report.
    pub fn format_status_update(&self, update: &StatusUpdate) -> String {
        let mut out = format!(
            "{} {:<8} {}",
            update.status.emoji(),
            update.provider.display_name(),
            self.color_for_status(update.status, update.status.label())
        );
        if let Some(message) = &update.message {
            out.push_str(&format!(" {}", self.dim(message)));
        }
        out
    }

    /// Formats a batch progress bar.
    pub fn progress_bar(&self, done: usize, total: usize) -> String {
        let filled = if total == 0 {
            0
        } else {
            (done * self.bar_width).div_ceil(total).min(self.bar_width)
        };
        let empty = self.bar_width - filled;

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );
        self.cyan(&bar)
    }

    // ========================================================================
    // Providers
    // ========================================================================

    /// Formats the providers table header.
    pub fn format_providers_header(&self) -> String {
        format!(
            "{}\n{}",
            self.bold(&format!(
                "{:<10} {:<8} {:<14} {:<6} {}",
                "Provider", "CLI", "Status", "Keys", "Models"
            )),
            "─".repeat(72)
        )
    }

    /// Formats a provider line.
    pub fn format_provider_line(
        &self,
        desc: &ProviderDescriptor,
        settings: &ProviderSettings,
        key_count: usize,
    ) -> String {
        let status = if settings.is_active {
            settings.status
        } else {
            ProviderStatus::Disabled
        };
        let status_text = format!("{} {}", status.emoji(), status.label());
        let models: Vec<&str> = desc.models.iter().map(|m| m.label.as_str()).collect();

        let mut out = format!(
            "{:<10} {:<8} {} {:<6} {}",
            desc.display_name(),
            desc.cli_name(),
            self.color_for_status(status, &format!("{status_text:<14}")),
            key_count,
            self.dim(&models.join(", "))
        );
        if let Some(url) = &settings.base_url {
            out.push_str(&format!("\n{:<10} {}", "", self.dim(&format!("base URL: {url}"))));
        }
        out
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Formats a key list heading.
    pub fn format_keys_header(&self, desc: &ProviderDescriptor) -> String {
        format!("{} {}", self.bold(desc.display_name()), self.dim(desc.metadata.console_url))
    }

    /// Formats a numbered, masked pool key.
    pub fn format_key_line(&self, index: usize, key: &str) -> String {
        format!("  {}. {}", index + 1, mask_key(key))
    }

    /// Formats the result of a key validation.
    pub fn format_validation(&self, label: &str, key: &str, result: &Result<(), FetchError>) -> String {
        match result {
            Ok(()) => format!("  {} {} {}", self.green("✓"), mask_key(key), self.dim(label)),
            Err(e) => {
                let mut out = format!(
                    "  {} {} {} {}",
                    self.red("✗"),
                    mask_key(key),
                    self.dim(label),
                    e
                );
                if let Some(hint) = e.user_hint() {
                    out.push_str(&format!("\n    {}", self.dim(hint)));
                }
                out
            }
        }
    }

    // ========================================================================
    // Color Helpers
    // ========================================================================

    fn color_for_status(&self, status: ProviderStatus, text: &str) -> String {
        match status {
            ProviderStatus::Active => self.green(text),
            ProviderStatus::RateLimited => self.yellow(text),
            ProviderStatus::Error => self.red(text),
            ProviderStatus::Disabled => self.dim(text),
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
