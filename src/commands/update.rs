//! Update command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::formatter::RenderOptions;
use crate::lock::LockGuard;
use crate::parser::parse_document;
use crate::ruleset::Ruleset;
use crate::sink::write_outputs;
use crate::stats::{RunState, SourceStats};
use crate::utils::{format_bytes, format_count};

/// Run the update command
pub async fn run(dry_run: bool, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let sources = config.enabled_sources();
    if sources.is_empty() {
        warn!("No sources enabled. Check your configuration.");
        return Ok(());
    }

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {:?}", config.output_dir)
    })?;

    // Serialize runs: the lock lives inside the output directory it protects
    let _lock = LockGuard::acquire(&config.lock_path())?;

    info!("Updating rule lists from {} sources...", sources.len());

    let fetcher = Fetcher::new()?;
    let results = fetcher.fetch_sources(&sources).await;

    let mut ruleset = Ruleset::new();
    let mut source_stats: Vec<SourceStats> = Vec::new();

    // Results arrive in source declaration order, so the first source
    // listing an entry is the one that keeps it.
    for (source, result) in sources.iter().zip(results) {
        let content = match result {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to fetch {}: {:#}", source.name, e);
                continue;
            }
        };

        let entries = match parse_document(&content, &source.format) {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to parse {}: {}", source.name, e);
                continue;
            }
        };

        let raw_count = entries.len();
        let mut added_count = 0;
        for entry in &entries {
            if ruleset.add(entry, &source.kind, source.class) {
                added_count += 1;
            }
        }

        info!(
            "{}: {} entries, {} new",
            source.name,
            format_count(raw_count),
            format_count(added_count)
        );

        source_stats.push(SourceStats {
            name: source.name.clone(),
            raw_count,
            added_count,
        });
    }

    let total_unique = ruleset.unique_len();
    let categories = ruleset.category_counts();

    info!(
        "Collected {} unique entries in {} categories ({} downloaded)",
        format_count(total_unique),
        categories.len(),
        format_bytes(fetcher.total_downloaded() as u64)
    );

    let output = ruleset.finalize(&RenderOptions {
        no_resolve: config.no_resolve,
    });

    if dry_run {
        println!();
        println!(
            "[DRY RUN] {} unique entries across {} files (nothing written)",
            format_count(total_unique),
            output.plain.len() + output.directives.len()
        );
        return Ok(());
    }

    let written = write_outputs(&config.output_dir, &config.directive_dir, &output);

    let mut state = RunState::load(&config.state_path()).unwrap_or_default();
    state.record_run(source_stats, categories, total_unique, output.covered_v4);
    if let Err(e) = state.save(&config.state_path()) {
        warn!("Failed to save run state: {:#}", e);
    }

    println!();
    println!(
        "[OK] {} unique entries written to {} files in {}",
        format_count(total_unique),
        written,
        config.output_dir.display()
    );

    Ok(())
}
