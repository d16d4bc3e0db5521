//! CLI command implementations.

pub mod config;
pub mod generate;
pub mod keys;
pub mod providers;

use anyhow::{Result, anyhow, bail};
use podmeta_core::ProviderKind;
use podmeta_providers::{ProviderDescriptor, ProviderRegistry};

/// Looks up a provider by CLI name or alias.
pub fn resolve_provider(name: &str) -> Result<&'static ProviderDescriptor> {
    ProviderRegistry::get_by_cli_name(name).ok_or_else(|| {
        let known: Vec<&str> = ProviderRegistry::all().iter().map(|d| d.cli_name()).collect();
        anyhow!("Unknown provider: {name}. Known providers: {}", known.join(", "))
    })
}

/// Parses `--provider`: nothing or `all` selects every provider, otherwise a
/// comma-separated list of names. Priority order is kept regardless of the
/// order given.
pub fn parse_provider_selection(arg: Option<&str>) -> Result<Vec<ProviderKind>> {
    match arg.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("all" | "") => Ok(ProviderRegistry::kinds()),
        Some(names) => {
            let mut selected = Vec::new();
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                selected.push(resolve_provider(name)?.id);
            }
            if selected.is_empty() {
                bail!("No valid providers specified");
            }
            Ok(ProviderRegistry::kinds()
                .into_iter()
                .filter(|kind| selected.contains(kind))
                .collect())
        }
    }
}
