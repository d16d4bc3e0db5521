//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use podmeta_core::Marketplace;
use podmeta_providers::ProviderRegistry;
use podmeta_store::{
    SettingsStore, default_config_dir, default_key_pool_path, default_settings_path,
};
use tracing::info;

use super::resolve_provider;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Enable a provider.
    Enable {
        /// Provider to enable.
        provider: String,
    },

    /// Disable a provider.
    Disable {
        /// Provider to disable.
        provider: String,
    },

    /// Set the default marketplace.
    Market {
        /// spreadshirt, teepublic or zazzle.
        market: Marketplace,
    },

    /// Override a provider's API base URL. Omit the URL to clear it.
    BaseUrl {
        /// Provider to configure.
        provider: String,
        /// New base URL (http or https).
        url: Option<String>,
    },

    /// Clear rate-limited and error statuses.
    ResetStatus,

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Enable { provider } => set_provider_active(provider, true).await,
        ConfigAction::Disable { provider } => set_provider_active(provider, false).await,
        ConfigAction::Market { market } => set_market(*market).await,
        ConfigAction::BaseUrl { provider, url } => set_base_url(provider, url.clone()).await,
        ConfigAction::ResetStatus => reset_status().await,
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let settings = store.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("Podmeta Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Marketplace: {}", settings.market);
            println!();
            println!("Providers:");
            let config = settings.provider_config();
            for desc in ProviderRegistry::all() {
                let Some(provider) = config.get(desc.id) else {
                    continue;
                };
                let state = if provider.is_active {
                    provider.status.label()
                } else {
                    "Disabled"
                };
                println!("  • {:<8} {}", desc.display_name(), state);
                if let Some(url) = &provider.base_url {
                    println!("    base URL: {url}");
                }
            }
            println!();
            println!("Max retries:     {}", settings.max_retries);
            println!(
                "Backoff:         {} ms base, {} ms jitter",
                settings.backoff_base_ms, settings.backoff_jitter_ms
            );
            println!("Request timeout: {} s", settings.request_timeout_secs);
            println!("Log level:       {}", settings.log_level);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let settings_path = default_settings_path();
    let key_pool_path = default_key_pool_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("Key pool file: {}", key_pool_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "configDir": config_dir.display().to_string(),
                "settingsFile": settings_path.display().to_string(),
                "keyPoolFile": key_pool_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_provider_active(name: &str, active: bool) -> Result<()> {
    let desc = resolve_provider(name)?;

    let store = SettingsStore::load_default().await?;
    store.set_provider_active(desc.id, active).await;
    store.save().await?;

    let verb = if active { "Enabled" } else { "Disabled" };
    info!(provider = %desc.display_name(), active, "Provider activation changed");
    println!("{verb}: {}", desc.display_name());

    Ok(())
}

async fn set_market(market: Marketplace) -> Result<()> {
    let store = SettingsStore::load_default().await?;
    store.set_market(market).await;
    store.save().await?;

    info!(market = %market, "Default marketplace updated");
    println!("Default marketplace set to: {market}");

    Ok(())
}

async fn set_base_url(name: &str, url: Option<String>) -> Result<()> {
    let desc = resolve_provider(name)?;

    let store = SettingsStore::load_default().await?;
    store.set_base_url(desc.id, url).await?;
    store.save().await?;

    let settings = store.provider(desc.id).await;
    let effective = desc.base_url(settings.base_url.as_deref());
    info!(provider = %desc.display_name(), base_url = %effective, "Base URL updated");
    println!("{} base URL: {effective}", desc.display_name());

    Ok(())
}

async fn reset_status() -> Result<()> {
    let store = SettingsStore::load_default().await?;
    let reset = store.reset_statuses().await;
    store.save().await?;

    if reset.is_empty() {
        println!("No provider statuses to reset");
    } else {
        for kind in reset {
            println!("Reset: {}", kind.display_name());
        }
    }

    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = default_settings_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Settings reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }

    Ok(())
}
