//! Stats command implementation.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::stats::display_stats;

/// Run the stats command
pub fn run(config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    display_stats(&config)
}
