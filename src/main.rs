//! ruleforge - Routing rule list aggregator
//!
//! Fetches published routing/ad-block rule lists and compiles them into
//! plain rulesets and Clash-style routing directives.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ruleforge::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Update { dry_run } => ruleforge::commands::update::run(dry_run, &cli.config).await,
        Commands::Sources => ruleforge::commands::sources::run(&cli.config),
        Commands::Stats => ruleforge::commands::stats::run(&cli.config),
        Commands::Init { force } => ruleforge::commands::init::run(force, &cli.config),
        Commands::Version => {
            println!("ruleforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
