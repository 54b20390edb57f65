//! Run state persistence and statistics display.

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::utils::{format_count, truncate};

/// Persistent record of the last update run (state.json)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RunState {
    pub last_update: Option<DateTime<Utc>>,
    pub sources: Vec<SourceStats>,
    pub categories: Vec<CategoryStats>,
    pub total_unique: usize,
    /// IPv4 addresses covered by the aggregated CIDR categories
    #[serde(default)]
    pub covered_v4: u64,
}

/// Statistics for a single rule source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStats {
    pub name: String,
    /// Entries the source document decoded to
    pub raw_count: usize,
    /// Entries this source was first to contribute
    pub added_count: usize,
}

/// Statistics for a single output category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub name: String,
    pub count: usize,
}

impl RunState {
    /// Load state from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save state to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Record the results of a completed run
    pub fn record_run(
        &mut self,
        sources: Vec<SourceStats>,
        categories: Vec<(String, usize)>,
        total_unique: usize,
        covered_v4: u64,
    ) {
        self.sources = sources;
        self.categories = categories
            .into_iter()
            .map(|(name, count)| CategoryStats { name, count })
            .collect();
        self.total_unique = total_unique;
        self.covered_v4 = covered_v4;
        self.last_update = Some(Utc::now());
    }
}

/// Display formatted statistics from the last run
pub fn display_stats(config: &Config) -> Result<()> {
    let state = RunState::load(&config.state_path()).unwrap_or_default();

    println!();
    println!("══════════════════════════════════════════════════════════════════");
    println!(" RULEFORGE RULESET STATISTICS");
    println!("══════════════════════════════════════════════════════════════════");
    println!();

    println!(" Output dir: {}", config.output_dir.display());
    println!(" Unique entries: {}", format_count(state.total_unique));
    if state.covered_v4 > 0 {
        println!(
            " IPv4 addresses covered: {}",
            format_count(state.covered_v4 as usize)
        );
    }
    println!();

    if !state.sources.is_empty() {
        println!(" SOURCE                   RAW          ADDED");
        println!(" ─────────────────────── ──────────── ────────────");

        for source in &state.sources {
            println!(
                " {:<23} {:>12} {:>12}",
                truncate(&source.name, 23),
                format_count(source.raw_count),
                format_count(source.added_count),
            );
        }

        println!(" ─────────────────────── ──────────── ────────────");
        println!(
            " {:<23} {:>12} {:>12}",
            "TOTAL",
            format_count(state.sources.iter().map(|s| s.raw_count).sum()),
            format_count(state.sources.iter().map(|s| s.added_count).sum()),
        );
        println!();
    }

    if !state.categories.is_empty() {
        println!(" CATEGORY                 ENTRIES");
        println!(" ─────────────────────── ────────────");

        for category in &state.categories {
            println!(
                " {:<23} {:>12}",
                truncate(&category.name, 23),
                format_count(category.count),
            );
        }
        println!();
    }

    if let Some(last_update) = state.last_update {
        let local: DateTime<Local> = last_update.into();
        let ago = format_duration_ago(last_update);
        println!(" Last update: {} ({})", local.format("%Y-%m-%d %H:%M:%S"), ago);
    } else {
        println!(" Last update: never");
    }

    println!("══════════════════════════════════════════════════════════════════");
    println!();

    Ok(())
}

/// Format duration since a timestamp
fn format_duration_ago(dt: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(dt);

    let seconds = duration.num_seconds();
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}
