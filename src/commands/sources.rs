//! Sources command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::stats::RunState;
use crate::utils::format_count;

/// Run the sources command
pub fn run(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    let state = RunState::load(&config.state_path()).unwrap_or_default();

    println!();
    println!("Rule Sources ({} total):", config.sources.len());
    println!();

    let enabled_count = config.sources.iter().filter(|s| s.enabled).count();
    let disabled_count = config.sources.len() - enabled_count;

    println!("  Enabled: {}, Disabled: {}", enabled_count, disabled_count);
    println!();

    println!("Enabled:");
    for source in config.sources.iter().filter(|s| s.enabled) {
        let added = state
            .sources
            .iter()
            .find(|s| s.name == source.name)
            .map(|s| s.added_count)
            .unwrap_or(0);

        if added > 0 {
            println!(
                "  [x] {} ({} -> {}, {} entries)",
                source.name,
                source.class,
                source.kind,
                format_count(added)
            );
        } else {
            println!("  [x] {} ({} -> {})", source.name, source.class, source.kind);
        }
    }

    println!();
    println!("Disabled:");
    for source in config.sources.iter().filter(|s| !s.enabled) {
        println!("  [ ] {} ({} -> {})", source.name, source.class, source.kind);
    }

    println!();
    println!("Edit the config file to enable or disable sources,");
    println!("then run 'ruleforge update' to regenerate the rule files");

    Ok(())
}
