//! `tsync config` - show the effective configuration.

use std::path::Path;

use anyhow::Result;
use console::style;

use tracksync_infra::config::{ENV_API_KEY, load_api_key};
use tracksync_types::config::StoreConfig;

/// Print `config` as loaded from `path` with environment overrides applied.
///
/// The API key is reported as set or unset, never printed.
pub fn show_config(config: &StoreConfig, path: &Path, json: bool) -> Result<()> {
    let api_key_set = load_api_key(|key| std::env::var(key).ok()).is_some();
    let valid = config.validate();

    if json {
        let out = serde_json::json!({
            "path": path.display().to_string(),
            "config": config,
            "api_key_set": api_key_set,
            "valid": valid.is_ok(),
            "error": valid.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} tracksync v{}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("  {}", style(path.display()).dim());
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    println!();
    println!(
        "  {}: {}",
        ENV_API_KEY,
        if api_key_set {
            style("set").green()
        } else {
            style("unset").dim()
        }
    );
    match valid {
        Ok(()) => println!("  {} Configuration is valid", style("✓").green()),
        Err(e) => println!("  {} {e}", style("✗").red()),
    }
    println!();
    Ok(())
}
