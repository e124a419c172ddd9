//! Pixel-Harvest main entry point
//!
//! This is the command-line interface for the Pixel-Harvest media harvester.

use anyhow::Context;
use clap::Parser;
use pixel_harvest::config::{load_config_with_hash, validate, Config};
use pixel_harvest::output::{generate_markdown_report, print_report};
use pixel_harvest::Coordinator;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

/// Pixel-Harvest: a polite, bounded media harvester
///
/// Pixel-Harvest fetches one entry page, follows its in-scope navigation
/// links, and downloads the unique content images found on those pages,
/// skipping decorative banners, icons and duplicates.
#[derive(Parser, Debug)]
#[command(name = "pixel-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite, bounded media harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the output directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Override the entry page URL
    #[arg(long, value_name = "URL")]
    entry_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(output) = &cli.output {
        config.output.directory = output.display().to_string();
    }
    if let Some(entry_url) = &cli.entry_url {
        config.crawl.entry_url = entry_url.clone();
    }
    if cli.output.is_some() || cli.entry_url.is_some() {
        validate(&config).context("invalid command-line override")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pixel_harvest=info,warn"),
            1 => EnvFilter::new("pixel_harvest=debug,info"),
            2 => EnvFilter::new("pixel_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Pixel-Harvest Dry Run ===\n");

    println!("Crawl:");
    println!("  Entry page: {}", config.crawl.entry_url);
    println!("  Scope: {}", config.crawl.scope.join(", "));
    println!("  Home markers: {}", config.crawl.home_markers.join(", "));

    println!("\nFetching:");
    println!("  Max concurrent pages: {}", config.fetch.max_concurrent);
    println!(
        "  Max concurrent media: {}",
        (config.fetch.max_concurrent / 2).max(1)
    );
    println!("  Page delay: {}ms", config.fetch.request_delay_ms);
    println!("  Media delay: {}ms", config.fetch.media_delay_ms);
    println!("  Timeout: {}s", config.fetch.request_timeout_secs);

    println!("\nNavigation Rules ({}):", config.navigation.rules.len());
    for rule in &config.navigation.rules {
        println!("  - {} [{:?}] {}", rule.name, rule.action, rule.pattern);
    }

    println!("\nNoise Rules ({}):", config.media.noise_rules.len());
    for rule in &config.media.noise_rules {
        println!("  - {} [{:?}] {}", rule.name, rule.target, rule.pattern);
    }

    println!("\nLimits:");
    println!("  Max bytes: {}", config.limits.max_bytes);
    println!("  Min dimension: {}px", config.limits.min_dimension);
    println!(
        "  Max dimensions: {}x{}px",
        config.limits.max_width, config.limits.max_height
    );

    println!("\nOutput:");
    println!("  Directory: {} (will be emptied)", config.output.directory);
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    let summary_path = config.output.summary_path.clone();

    let mut coordinator = Coordinator::new(config)?.with_config_hash(config_hash);

    // Ctrl-C stops the run at the next batch boundary
    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current batch");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = match coordinator.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    print_report(&report);

    if let Some(path) = summary_path {
        generate_markdown_report(&report, Path::new(&path))
            .with_context(|| format!("failed to write report to {}", path))?;
        println!("✓ Report written to: {}", path);
    }

    Ok(())
}
