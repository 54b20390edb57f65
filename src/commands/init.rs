//! Init command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;

/// Run the init command: write the default config file
pub fn run(force: bool, config_path: &Path) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {:?}\n\
             Use --force to overwrite it.",
            config_path
        );
    }

    let config = Config::default();
    config.save(config_path)?;

    println!("[OK] Wrote default config to {}", config_path.display());
    println!("     {} sources configured", config.sources.len());
    println!("     Run 'ruleforge update' to generate the rule files");

    Ok(())
}
