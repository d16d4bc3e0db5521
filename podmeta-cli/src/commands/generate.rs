//! Generate command implementation.
//!
//! Reads each image, runs it through the provider fallback pipeline and
//! prints marketplace-ready metadata. Items are processed strictly one after
//! another; statuses reported during the run are saved back to settings.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use podmeta_core::{CredentialPool, Marketplace, ProviderConfigSet, ProviderKind};
use podmeta_fetch::{CancellationToken, FetchContext, FetchError, VisionPipeline};
use podmeta_providers::build_pipeline;
use podmeta_store::{CredentialStore, KeyPoolStore, SettingsStore, StatusBoard};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::parse_provider_selection;
use crate::output::{JsonFormatter, TextFormatter};
use crate::queue::{BatchQueue, ItemError, QueueItem};
use crate::{Cli, OutputFormat};

/// Arguments for the generate command.
#[derive(Args, Debug, Default)]
pub struct GenerateArgs {
    /// Image files (png, jpg, jpeg, webp, gif).
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Target marketplace: spreadshirt, teepublic or zazzle.
    /// Defaults to the configured marketplace.
    #[arg(long, short)]
    pub market: Option<Marketplace>,
}

/// Why a run did not finish cleanly.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Some items failed.
    #[error("{failed} of {total} items failed")]
    ItemsFailed {
        /// Failed items.
        failed: usize,
        /// Items in the run.
        total: usize,
    },

    /// The run was interrupted.
    #[error("Cancelled with {pending} items not processed")]
    Cancelled {
        /// Items left pending.
        pending: usize,
    },
}

/// Progress notifications from [`process_queue`].
pub enum QueueEvent<'a> {
    /// An item moved to processing.
    Started {
        /// 1-based position within this run.
        position: usize,
        /// Runnable items in this run.
        total: usize,
        /// The item.
        item: &'a QueueItem,
    },
    /// An item completed, failed or was put back.
    Finished {
        /// The item.
        item: &'a QueueItem,
    },
}

/// Runs the generate command.
pub async fn run(args: &GenerateArgs, cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let market = match args.market {
        Some(market) => market,
        None => store.market().await,
    };

    let reset = store.reset_statuses().await;
    if !reset.is_empty() {
        debug!(providers = ?reset, "Cleared provider statuses from the last run");
    }

    let settings = store.get().await;
    let pool = Arc::new(KeyPoolStore::default_location().load().await);
    let mut config = settings.provider_config();
    CredentialStore::new().resolve_into(&mut config, &pool).await;

    if let Some(selection) = cli.provider.as_deref() {
        restrict_providers(&mut config, &parse_provider_selection(Some(selection))?);
    }
    if !has_usable_provider(&config, &pool) {
        return Err(FetchError::NoProviderAvailable.into());
    }

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling the run");
            interrupt.cancel();
        }
    });

    let ctx = FetchContext::builder()
        .settings(settings.fetch_settings())
        .cancel(cancel)
        .build();
    let pipeline = build_pipeline(&config, pool);
    let board = StatusBoard::new();
    let mut queue = BatchQueue::from_paths(&args.files);

    info!(items = queue.len(), market = %market, "Starting run");

    let text = TextFormatter::new(!cli.no_color);
    let show_text = cli.format == OutputFormat::Text && !cli.quiet;

    if show_text {
        for item in queue.items().iter().filter(|i| !i.is_runnable()) {
            println!("{}", text.format_item(item, market));
        }
    }

    process_queue(&mut queue, &pipeline, &ctx, market, &mut config, &board, |event| {
        if !show_text {
            return;
        }
        match event {
            QueueEvent::Started {
                position,
                total,
                item,
            } => eprintln!("{}", text.format_progress(position, total, item)),
            QueueEvent::Finished { item } => println!("{}\n", text.format_item(item, market)),
        }
    })
    .await;

    let updates = board.snapshot();
    store.apply_status_updates(&updates).await;
    if let Err(e) = store.save().await {
        warn!(error = %e, "Failed to save provider statuses");
    }

    let summary = queue.summary();
    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format_generate(market, queue.items(), summary.clone(), updates)?
            );
        }
        OutputFormat::Text if !cli.quiet => {
            for update in updates.iter().filter(|u| u.status.has_issues()) {
                println!("{}", text.format_status_update(update));
            }
            println!("{}", text.format_summary(&summary));
        }
        OutputFormat::Text => {}
    }

    if summary.pending > 0 {
        return Err(BatchError::Cancelled {
            pending: summary.pending,
        }
        .into());
    }
    if summary.failed > 0 {
        return Err(BatchError::ItemsFailed {
            failed: summary.failed,
            total: summary.total,
        }
        .into());
    }
    Ok(())
}

/// Processes every runnable item, one at a time.
///
/// Statuses reported for earlier items are folded into `config` before each
/// request, so a provider that hit its rate limit is skipped for the rest of
/// the run. Cancellation puts the in-flight item back to pending and stops.
pub async fn process_queue<F>(
    queue: &mut BatchQueue,
    pipeline: &VisionPipeline,
    ctx: &FetchContext,
    market: Marketplace,
    config: &mut ProviderConfigSet,
    board: &StatusBoard,
    mut on_event: F,
) where
    F: FnMut(QueueEvent<'_>),
{
    let runnable = queue.runnable();
    let total = runnable.len();

    for (n, index) in runnable.into_iter().enumerate() {
        if ctx.is_cancelled() {
            break;
        }
        let Some(item) = queue.get_mut(index) else {
            continue;
        };
        if !item.start() {
            continue;
        }
        on_event(QueueEvent::Started {
            position: n + 1,
            total,
            item: &*item,
        });

        let result = match item.load().await {
            Ok(image) => {
                board.apply_to(config);
                pipeline
                    .generate_metadata(ctx, &image, market, config, board)
                    .await
                    .map_err(ItemError::from)
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(generated) => {
                info!(
                    file = %item.path.display(),
                    provider = %generated.provider,
                    model = %generated.model,
                    "Item completed"
                );
                item.complete(generated);
            }
            Err(ItemError::Generation(FetchError::Cancelled)) => {
                item.requeue();
                on_event(QueueEvent::Finished { item: &*item });
                break;
            }
            Err(e) => {
                warn!(file = %item.path.display(), error = %e, "Item failed");
                item.fail(e);
            }
        }
        on_event(QueueEvent::Finished { item: &*item });
    }
}

/// Deactivates every provider not in `selected` for this run only.
fn restrict_providers(config: &mut ProviderConfigSet, selected: &[ProviderKind]) {
    for kind in ProviderKind::all() {
        if !selected.contains(kind) {
            config.entry(*kind).is_active = false;
        }
    }
}

/// Returns true if at least one active provider has a credential.
fn has_usable_provider(config: &ProviderConfigSet, pool: &CredentialPool) -> bool {
    config
        .iter()
        .any(|(kind, settings)| settings.is_active && (settings.api_key().is_some() || !pool.is_empty(*kind)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use podmeta_core::{ApiResponse, ImagePayload, ProviderRoute, ProviderSettings, ProviderStatus, RequestTarget};
    use podmeta_fetch::{RetryStrategy, VisionBackend};

    use crate::queue::ItemStatus;

    /// Mistral always answers 429; Groq always succeeds.
    #[derive(Default)]
    struct MistralLimitedBackend {
        calls: Mutex<Vec<ProviderKind>>,
    }

    #[async_trait]
    impl VisionBackend for MistralLimitedBackend {
        fn id(&self) -> &str {
            "mistral-limited"
        }

        async fn analyze(
            &self,
            _ctx: &FetchContext,
            target: &RequestTarget,
            _image: &ImagePayload,
            _market: Marketplace,
        ) -> Result<ApiResponse, FetchError> {
            self.calls.lock().unwrap().push(target.provider);
            match target.provider {
                ProviderKind::Mistral => Err(FetchError::from_status(
                    target.provider,
                    &target.model,
                    429,
                    "rate limited",
                    None,
                )),
                ProviderKind::Groq => Ok(ApiResponse::new("Cat", "A cat", ["cat", "pet"])),
            }
        }
    }

    fn routes() -> Vec<ProviderRoute> {
        vec![
            ProviderRoute::new(ProviderKind::Mistral, "http://mistral.test/v1").with_model("m", "M"),
            ProviderRoute::new(ProviderKind::Groq, "http://groq.test/v1").with_model("g", "G"),
        ]
    }

    fn config() -> ProviderConfigSet {
        ProviderConfigSet::new()
            .with(ProviderKind::Mistral, ProviderSettings::with_key("mistral-key"))
            .with(ProviderKind::Groq, ProviderSettings::with_key("gsk_key"))
    }

    fn context() -> FetchContext {
        FetchContext::builder().retry(RetryStrategy::no_retry()).build()
    }

    async fn write_images(dir: &std::path::Path, names: &[&str]) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for name in names {
            let path = dir.join(name);
            tokio::fs::write(&path, b"image bytes").await.unwrap();
            paths.push(path);
        }
        paths
    }

    #[tokio::test]
    async fn test_rate_limited_provider_skipped_for_later_items() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_images(dir.path(), &["a.png", "b.jpg"]).await;

        let backend = Arc::new(MistralLimitedBackend::default());
        let pipeline = VisionPipeline::new(backend.clone(), routes());
        let board = StatusBoard::new();
        let mut config = config();
        let mut queue = BatchQueue::from_paths(&paths);
        let mut events = Vec::new();

        process_queue(&mut queue, &pipeline, &context(), Marketplace::Zazzle, &mut config, &board, |e| {
            events.push(match e {
                QueueEvent::Started { position, total, .. } => format!("start {position}/{total}"),
                QueueEvent::Finished { item } => format!("done {}", item.status),
            });
        })
        .await;

        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec![ProviderKind::Mistral, ProviderKind::Groq, ProviderKind::Groq]
        );
        assert_eq!(events, vec!["start 1/2", "done completed", "start 2/2", "done completed"]);
        assert_eq!(
            board.latest(ProviderKind::Mistral).unwrap().status,
            ProviderStatus::RateLimited
        );
        assert_eq!(queue.summary().by_provider.get("groq"), Some(&2));
    }

    #[tokio::test]
    async fn test_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_images(dir.path(), &["ok.webp"]).await;
        paths.push(dir.path().join("notes.txt"));
        paths.push(dir.path().join("missing.png"));

        let backend = Arc::new(MistralLimitedBackend::default());
        let pipeline = VisionPipeline::new(backend.clone(), routes());
        let mut queue = BatchQueue::from_paths(&paths);

        process_queue(
            &mut queue,
            &pipeline,
            &context(),
            Marketplace::Spreadshirt,
            &mut config(),
            &StatusBoard::new(),
            |_| {},
        )
        .await;

        let statuses: Vec<_> = queue.items().iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![ItemStatus::Completed, ItemStatus::Error, ItemStatus::Error]
        );
        assert!(matches!(queue.items()[1].error, Some(ItemError::Unsupported(_))));
        assert!(matches!(queue.items()[2].error, Some(ItemError::Read(_))));
        // Only the readable image reached a provider.
        assert_eq!(backend.calls.lock().unwrap().len(), 2);

        let completed = queue.items()[0].result.as_ref().unwrap();
        assert_eq!(completed.metadata.tags.len(), 25);
    }

    #[tokio::test]
    async fn test_cancelled_run_leaves_items_pending() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_images(dir.path(), &["a.png", "b.png"]).await;

        let backend = Arc::new(MistralLimitedBackend::default());
        let pipeline = VisionPipeline::new(backend.clone(), routes());
        let ctx = context();
        ctx.cancel.cancel();
        let mut queue = BatchQueue::from_paths(&paths);

        process_queue(
            &mut queue,
            &pipeline,
            &ctx,
            Marketplace::Zazzle,
            &mut config(),
            &StatusBoard::new(),
            |_| {},
        )
        .await;

        assert!(backend.calls.lock().unwrap().is_empty());
        assert_eq!(queue.summary().pending, 2);
    }

    #[test]
    fn test_restrict_providers() {
        let mut config = config();
        restrict_providers(&mut config, &[ProviderKind::Groq]);
        assert!(!config.get(ProviderKind::Mistral).unwrap().is_active);
        assert!(config.get(ProviderKind::Groq).unwrap().is_active);
    }

    #[test]
    fn test_has_usable_provider() {
        let pool = CredentialPool::new();
        assert!(has_usable_provider(&config(), &pool));

        let no_keys = ProviderConfigSet::new()
            .with(ProviderKind::Mistral, ProviderSettings::default())
            .with(ProviderKind::Groq, ProviderSettings::default());
        assert!(!has_usable_provider(&no_keys, &pool));

        pool.add(ProviderKind::Groq, "gsk_pooled");
        assert!(has_usable_provider(&no_keys, &pool));

        let mut inactive = config();
        restrict_providers(&mut inactive, &[]);
        assert!(!has_usable_provider(&inactive, &CredentialPool::new()));
    }
}
