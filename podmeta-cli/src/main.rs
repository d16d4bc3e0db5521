// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Podmeta CLI - SEO metadata for print-on-demand designs from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Generate Spreadshirt metadata for every PNG in a folder
//! podmeta generate designs/*.png --market spreadshirt
//!
//! # Only use Groq, JSON output
//! podmeta generate cat.png --provider groq --format json --pretty
//!
//! # Add keys to the rotation pool
//! podmeta keys add groq gsk_...
//! podmeta keys add mistral ... --keychain
//!
//! # Check every configured key
//! podmeta keys validate
//!
//! # List providers in fallback order
//! podmeta providers
//!
//! # Disable a provider
//! podmeta config disable mistral
//! ```

mod commands;
mod output;
mod queue;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use podmeta_fetch::{ErrorKind, FetchError};
use podmeta_store::{LogLevel, Settings, default_settings_path, load_json};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::generate::BatchError;
use commands::{config, generate, keys, providers};

// ============================================================================
// CLI Definition
// ============================================================================

/// Podmeta CLI - print-on-demand SEO metadata from vision models.
#[derive(Parser)]
#[command(name = "podmeta")]
#[command(about = "Print-on-demand SEO metadata from vision models")]
#[command(long_about = r#"
Podmeta looks at your designs and writes marketplace-ready titles,
descriptions and tags.

Providers, tried in this order:
  • Mistral (mistral)
  • Groq (groq)

Marketplaces:
  • Spreadshirt  title ≤ 50, description ≤ 200, exactly 25 tags
  • TeePublic    main tag plus 25 tags
  • Zazzle       title ≤ 100, up to 10 tags

Examples:
  podmeta generate cat.png              # Default marketplace
  podmeta generate *.png -m teepublic   # TeePublic metadata
  podmeta keys add groq gsk_...         # Add a pool key
  podmeta providers                     # Provider status
"#)]
#[command(version)]
#[command(author = "Podmeta Contributors")]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Providers to use or show ("all" or comma-separated, e.g. "groq").
    #[arg(long, short, global = true)]
    pub provider: Option<String>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate metadata for image files.
    #[command(visible_alias = "g")]
    Generate(generate::GenerateArgs),

    /// Manage API keys.
    #[command(visible_alias = "k")]
    Keys(keys::KeysArgs),

    /// List providers in fallback order.
    #[command(visible_alias = "p")]
    Providers,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// No provider is active with a key.
    NoProvider = 2,
    /// Some items failed.
    ItemsFailed = 3,
    /// Interrupted.
    Cancelled = 4,
}

impl ExitCode {
    /// Picks the exit code for a command error.
    fn for_error(error: &anyhow::Error) -> Self {
        if let Some(batch) = error.downcast_ref::<BatchError>() {
            return match batch {
                BatchError::ItemsFailed { .. } => Self::ItemsFailed,
                BatchError::Cancelled { .. } => Self::Cancelled,
            };
        }
        match error.downcast_ref::<FetchError>().map(FetchError::kind) {
            Some(ErrorKind::NoProviderAvailable) => Self::NoProvider,
            Some(ErrorKind::Cancelled) => Self::Cancelled,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("podmeta=debug,info")
    } else {
        EnvFilter::new(format!("podmeta={level}"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = load_json::<Settings>(&default_settings_path())
        .await
        .map(|s| s.log_level)
        .unwrap_or_default();
    setup_logging(cli.verbose, cli.quiet, level);

    let result = match &cli.command {
        Commands::Generate(args) => generate::run(args, &cli).await,
        Commands::Keys(args) => keys::run(args, &cli).await,
        Commands::Providers => providers::run(&cli).await,
        Commands::Config(args) => config::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
            if let Some(hint) = e.downcast_ref::<FetchError>().and_then(FetchError::user_hint) {
                eprintln!("{hint}");
            }
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "podmeta", "generate", "a.png", "b.jpg", "--market", "teepublic", "-p", "groq", "-f", "json",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.provider.as_deref(), Some("groq"));
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.files.len(), 2);
        assert_eq!(args.market, Some(podmeta_core::Marketplace::TeePublic));
    }

    #[test]
    fn test_parse_rejects_unknown_market() {
        assert!(Cli::try_parse_from(["podmeta", "generate", "a.png", "-m", "etsy"]).is_err());
        assert!(Cli::try_parse_from(["podmeta", "generate"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let err = anyhow::Error::from(FetchError::NoProviderAvailable);
        assert_eq!(ExitCode::for_error(&err), ExitCode::NoProvider);

        let err = anyhow::Error::from(BatchError::ItemsFailed { failed: 1, total: 2 });
        assert_eq!(ExitCode::for_error(&err), ExitCode::ItemsFailed);

        let err = anyhow::Error::from(BatchError::Cancelled { pending: 3 });
        assert_eq!(ExitCode::for_error(&err), ExitCode::Cancelled);

        assert_eq!(ExitCode::for_error(&anyhow::anyhow!("boom")), ExitCode::Error);
        assert_eq!(ExitCode::Success as i32, 0);
    }
}
