//! Providers command - list providers in fallback order.

use anyhow::Result;
use podmeta_providers::ProviderRegistry;
use podmeta_store::{KeyPoolStore, SettingsStore};
use tracing::info;

use super::parse_provider_selection;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the providers command.
pub async fn run(cli: &Cli) -> Result<()> {
    info!("Listing providers");

    let selected = parse_provider_selection(cli.provider.as_deref())?;
    let settings = SettingsStore::load_default().await?.get().await;
    let config = settings.provider_config();
    let pool = KeyPoolStore::default_location().load().await;

    let rows: Vec<_> = ProviderRegistry::all()
        .iter()
        .filter(|desc| selected.contains(&desc.id))
        .map(|desc| {
            let provider = config.get(desc.id).cloned().unwrap_or_default();
            (desc, provider, pool.len(desc.id))
        })
        .collect();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);

            println!("{}", formatter.format_providers_header());
            for (desc, provider, key_count) in &rows {
                println!("{}", formatter.format_provider_line(desc, provider, *key_count));
            }

            println!();
            println!(
                "Total: {} providers ({} active). Tried in the order shown.",
                rows.len(),
                rows.iter().filter(|(_, p, _)| p.is_active).count()
            );
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_providers(&rows)?);
        }
    }

    Ok(())
}
