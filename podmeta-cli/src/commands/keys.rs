//! Keys command - manage API keys.
//!
//! Pool keys live in the key pool file and are rotated per request. A single
//! key per provider can also be kept in the system keychain. Keys are only
//! ever printed masked.

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use podmeta_core::{CredentialPool, ProviderKind, mask_key};
use podmeta_fetch::{FetchContext, RetryStrategy};
use podmeta_providers::{ProviderDescriptor, ProviderRegistry, validate_key};
use podmeta_store::{CredentialStore, KeyPoolStore, KeySource, SettingsStore};
use tracing::{info, warn};

use super::{parse_provider_selection, resolve_provider};
use crate::output::{JsonFormatter, KeysOutput, TextFormatter, ValidationOutput};
use crate::{Cli, OutputFormat};

/// Arguments for the keys command.
#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub action: KeysAction,
}

/// Keys subcommands.
#[derive(Subcommand)]
pub enum KeysAction {
    /// Add a key to a provider's pool.
    Add {
        /// Provider the key belongs to.
        provider: String,
        /// The API key.
        key: String,
        /// Store the key in the system keychain instead of the pool.
        #[arg(long)]
        keychain: bool,
    },

    /// List configured keys (masked).
    #[command(visible_alias = "ls")]
    List,

    /// Remove a key by value or by its number in `keys list`.
    #[command(visible_alias = "rm")]
    Remove {
        /// Provider the key belongs to.
        provider: String,
        /// Key value or 1-based position. Not needed with --keychain.
        key: Option<String>,
        /// Remove the keychain entry instead.
        #[arg(long)]
        keychain: bool,
    },

    /// Check every configured key against the provider API.
    Validate,
}

/// Runs the keys command.
pub async fn run(args: &KeysArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        KeysAction::Add {
            provider,
            key,
            keychain,
        } => add_key(provider, key, *keychain, cli).await,
        KeysAction::List => list_keys(cli).await,
        KeysAction::Remove {
            provider,
            key,
            keychain,
        } => remove_key(provider, key.as_deref(), *keychain).await,
        KeysAction::Validate => validate_keys(cli).await,
    }
}

async fn add_key(name: &str, key: &str, keychain: bool, cli: &Cli) -> Result<()> {
    let desc = resolve_provider(name)?;
    let key = key.trim();
    if key.is_empty() {
        bail!("Key is empty");
    }

    if let Some(prefix) = desc.metadata.key_prefix {
        if !key.starts_with(prefix) && !cli.quiet {
            eprintln!("Note: {} keys usually start with \"{prefix}\"", desc.display_name());
        }
    }

    if keychain {
        CredentialStore::new().store_in_keychain(desc.id, key).await?;
        info!(provider = %desc.id, key = %mask_key(key), "Key stored in keychain");
        println!("Stored {} key {} in the keychain", desc.display_name(), mask_key(key));
        return Ok(());
    }

    let store = KeyPoolStore::default_location();
    if store.add(desc.id, key).await? {
        info!(provider = %desc.id, key = %mask_key(key), "Key added to pool");
        println!("Added {} key {}", desc.display_name(), mask_key(key));
    } else {
        println!("{} key {} is already in the pool", desc.display_name(), mask_key(key));
    }
    Ok(())
}

async fn list_keys(cli: &Cli) -> Result<()> {
    let selected = parse_provider_selection(cli.provider.as_deref())?;
    let pool = KeyPoolStore::default_location().load().await;
    let credentials = CredentialStore::new();

    let mut outputs = Vec::new();
    let text = TextFormatter::new(!cli.no_color);

    for desc in ProviderRegistry::all().iter().filter(|d| selected.contains(&d.id)) {
        let keys = pool.keys(desc.id);
        let keychain = credentials.keychain_key(desc.id).await;
        let env = env_key(desc.id);

        match cli.format {
            OutputFormat::Text => {
                println!("{}", text.format_keys_header(desc));
                if let Some(key) = &env {
                    println!("  env       {} ({})", mask_key(key), desc.id.api_key_env());
                }
                if let Some(key) = &keychain {
                    println!("  keychain  {}", mask_key(key));
                }
                for (i, key) in keys.iter().enumerate() {
                    println!("{}", text.format_key_line(i, key));
                }
                if keys.is_empty() && env.is_none() && keychain.is_none() {
                    println!("  (no keys)");
                }
                println!();
            }
            OutputFormat::Json => outputs.push(KeysOutput {
                provider: desc.cli_name().to_string(),
                pool: keys.iter().map(|k| mask_key(k)).collect(),
                keychain: keychain.is_some(),
                env: env.is_some(),
            }),
        }
    }

    if cli.format == OutputFormat::Json {
        println!("{}", JsonFormatter::new(cli.pretty).format(&outputs)?);
    }
    Ok(())
}

async fn remove_key(name: &str, key: Option<&str>, keychain: bool) -> Result<()> {
    let desc = resolve_provider(name)?;

    if keychain {
        CredentialStore::new().delete_from_keychain(desc.id).await?;
        println!("Removed {} key from the keychain", desc.display_name());
        return Ok(());
    }

    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        bail!("Give the key or its number from `podmeta keys list`");
    };

    let store = KeyPoolStore::default_location();
    let pool = store.load().await;
    let key = select_key(&pool, desc.id, key);

    if store.remove(desc.id, &key).await? {
        info!(provider = %desc.id, key = %mask_key(&key), "Key removed from pool");
        println!("Removed {} key {}", desc.display_name(), mask_key(&key));
        Ok(())
    } else {
        bail!("{} has no pool key {}", desc.display_name(), mask_key(&key))
    }
}

/// Resolves a 1-based position to the pooled key; anything else is taken as
/// the key itself.
fn select_key(pool: &CredentialPool, provider: ProviderKind, arg: &str) -> String {
    let keys = pool.keys(provider);
    match arg.parse::<usize>() {
        Ok(n) if (1..=keys.len()).contains(&n) => keys[n - 1].clone(),
        _ => arg.to_string(),
    }
}

async fn validate_keys(cli: &Cli) -> Result<()> {
    let selected = parse_provider_selection(cli.provider.as_deref())?;
    let settings = SettingsStore::load_default().await?.get().await;
    let config = settings.provider_config();
    let pool = KeyPoolStore::default_location().load().await;
    let credentials = CredentialStore::new();

    let ctx = FetchContext::builder()
        .settings(settings.fetch_settings())
        .retry(RetryStrategy::no_retry())
        .build();

    let text = TextFormatter::new(!cli.no_color);
    let mut outputs = Vec::new();

    for desc in ProviderRegistry::all().iter().filter(|d| selected.contains(&d.id)) {
        let base_url = config.get(desc.id).and_then(|p| p.base_url.as_deref());
        let candidates = candidate_keys(desc, &pool, &credentials).await;

        if cli.format == OutputFormat::Text {
            println!("{}", text.format_keys_header(desc));
            if candidates.is_empty() {
                println!("  (no keys)");
            }
        }

        for (key, source) in candidates {
            let result = validate_key(&ctx, desc, base_url, &key).await;
            if let Err(e) = &result {
                warn!(provider = %desc.id, key = %mask_key(&key), error = %e, "Key rejected");
            }
            match cli.format {
                OutputFormat::Text => {
                    println!("{}", text.format_validation(&source.to_string(), &key, &result));
                }
                OutputFormat::Json => {
                    outputs.push(ValidationOutput::new(desc, &key, &source.to_string(), &result));
                }
            }
        }
        if cli.format == OutputFormat::Text {
            println!();
        }
    }

    if cli.format == OutputFormat::Json {
        println!("{}", JsonFormatter::new(cli.pretty).format(&outputs)?);
    }
    Ok(())
}

/// Every distinct key configured for a provider, with where it came from.
async fn candidate_keys(
    desc: &ProviderDescriptor,
    pool: &CredentialPool,
    credentials: &CredentialStore,
) -> Vec<(String, KeySource)> {
    let mut keys: Vec<(String, KeySource)> = Vec::new();
    let mut push = |key: String, source: KeySource| {
        if !keys.iter().any(|(k, _)| *k == key) {
            keys.push((key, source));
        }
    };

    if let Some(key) = env_key(desc.id) {
        push(key, KeySource::Env);
    }
    if let Some(key) = credentials.keychain_key(desc.id).await {
        push(key.trim().to_string(), KeySource::Keychain);
    }
    for key in pool.keys(desc.id) {
        push(key, KeySource::Pool);
    }
    keys
}

fn env_key(provider: ProviderKind) -> Option<String> {
    std::env::var(provider.api_key_env())
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}
