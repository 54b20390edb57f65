//! # ruleforge - Routing rule list aggregator
//!
//! Fetches published routing/ad-block rule lists (domain suffixes, CIDR
//! blocks, process names), normalizes them into a uniform entry model,
//! deduplicates globally, compresses CIDR sets to their minimal covering
//! form, and emits plain per-category text files plus Clash-style routing
//! directives.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ruleforge                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: update, sources, stats, init, version      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Config (serde_yaml)                                        │
//! │    └── Sources: name, url, format, kind, class              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Fetcher (reqwest + rustls)                                 │
//! │    └── Ordered, size-capped downloads with retry            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Parser (serde_yaml)                                        │
//! │    └── Plain lists and Clash rule-provider payloads         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Ruleset                                                    │
//! │    └── Global dedup (first source wins) + categories        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Aggregator (ipnet)                                         │
//! │    └── CIDR compression to minimal covering blocks          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Formatter + Sink                                           │
//! │    ├── Plain lists: <Class>_<Kind>.txt                      │
//! │    └── Clash directives: clash/<Class>.txt                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use ruleforge::config::Config;
//! use ruleforge::fetcher::Fetcher;
//! use ruleforge::formatter::RenderOptions;
//! use ruleforge::parser::parse_document;
//! use ruleforge::ruleset::Ruleset;
//! use ruleforge::sink::write_outputs;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load_or_default("ruleforge.yaml")?;
//!     let sources = config.enabled_sources();
//!
//!     let fetcher = Fetcher::new()?;
//!     let results = fetcher.fetch_sources(&sources).await;
//!
//!     let mut ruleset = Ruleset::new();
//!     for (source, result) in sources.iter().zip(results) {
//!         let Ok(content) = result else { continue };
//!         for entry in parse_document(&content, &source.format)? {
//!             ruleset.add(&entry, &source.kind, source.class);
//!         }
//!     }
//!
//!     let output = ruleset.finalize(&RenderOptions::default());
//!     write_outputs(&config.output_dir, &config.directive_dir, &output);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`aggregator`] - CIDR aggregation into minimal covering blocks
//! - [`cli`] - Command-line interface definitions
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`error`] - Error taxonomy
//! - [`fetcher`] - HTTP client for downloading rule lists
//! - [`formatter`] - Plain and Clash directive rendering
//! - [`lock`] - File locking for concurrent execution prevention
//! - [`parser`] - Source document decoding
//! - [`ruleset`] - Global dedup and category grouping
//! - [`sink`] - Atomic output file writes
//! - [`stats`] - State persistence and statistics
//! - [`utils`] - Common utility functions (formatting, truncation)

pub mod aggregator;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod formatter;
pub mod lock;
pub mod parser;
pub mod ruleset;
pub mod sink;
pub mod stats;
pub mod utils;

pub use cli::{Cli, Commands};
pub use config::Config;
