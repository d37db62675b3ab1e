//! VK Audience main entry point
//!
//! This is the command-line foreground for the audience harvester. It starts
//! crawl runs on a background task and renders their progress events.

use clap::Parser;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use vk_audience::audience::{CrawlTarget, Segment};
use vk_audience::config::{load_config_with_hash, Config};
use vk_audience::crawler::{CancelFlag, Coordinator, CrawlEvent, RunReport};
use vk_audience::output::{load_statistics, print_statistics, AudienceExporter};
use vk_audience::storage::{lock_store, open_shared, SharedStore};

/// VK Audience: harvest and export advertising audiences
///
/// Collects members of VK groups and friends and followers of VK users,
/// deduplicates them in a local database, and exports segments as CSV files
/// for audience upload.
#[derive(Parser, Debug)]
#[command(name = "vk-audience")]
#[command(version)]
#[command(about = "Harvest and export VK advertising audiences", long_about = None)]
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

    /// Validate config and show what would be harvested without crawling
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    dry_run: bool,

    /// Show audience statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    stats: bool,

    /// Export a segment (all, male, female, new, new-male, new-female) and exit
    #[arg(long, value_name = "SEGMENT", conflicts_with_all = ["dry_run", "stats"])]
    export: Option<Segment>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(segment) = cli.export {
        handle_export(&config, segment)?;
    } else {
        handle_crawl(config, config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vk_audience=info,warn"),
            1 => EnvFilter::new("vk_audience=debug,info"),
            2 => EnvFilter::new("vk_audience=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== VK Audience Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  Version: {}", config.api.version);
    println!("  Request delay: {}ms", config.api.request_delay);
    println!("  Page size: {}", config.api.page_size);
    println!(
        "  Access token: {}",
        if config.api.resolve_token().is_ok() {
            "present"
        } else {
            "MISSING"
        }
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export directory: {}", config.output.export_dir);
    println!("  Minimum export size: {}", config.output.min_export_size);

    let targets = CrawlTarget::from_lists(&config.targets.groups, &config.targets.users);
    println!("\nTargets ({}):", targets.len());
    for target in &targets {
        println!("  - {}", target);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows audience statistics
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_shared(Path::new(&config.output.database_path))?;
    print_current_statistics(&store)?;

    Ok(())
}

/// Handles the --export mode: writes one segment as CSV
fn handle_export(config: &Config, segment: Segment) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_shared(Path::new(&config.output.database_path))?;
    let exporter =
        AudienceExporter::new(&config.output.export_dir).with_min_size(config.output.min_export_size);

    let path = {
        let guard = lock_store(&store)?;
        exporter.export(&*guard, segment)?
    };

    println!("✓ Segment {} exported to: {}", segment, path.display());
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> Result<(), Box<dyn std::error::Error>> {
    let targets = CrawlTarget::from_lists(&config.targets.groups, &config.targets.users);
    tracing::info!(
        "Groups: {}, Users: {}",
        config.targets.groups.len(),
        config.targets.users.len()
    );

    let store = open_shared(Path::new(&config.output.database_path))?;
    let cancel = CancelFlag::new();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();

    let mut coordinator = Coordinator::from_config(&config, store.clone())?
        .with_config_hash(config_hash)
        .with_events(events_tx)
        .with_cancel_flag(cancel.clone());

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current target");
            interrupt.cancel();
        }
    });

    let run = tokio::spawn(async move { coordinator.run(&targets).await });

    while let Some(event) = events_rx.recv().await {
        render_event(&event);
    }

    match run.await? {
        Ok(report) => {
            tracing::info!("Crawl run {} finished", report.run_id);
            print_current_statistics(&store)?;
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Renders one crawl event for the terminal
fn render_event(event: &CrawlEvent) {
    match event {
        CrawlEvent::RunStarted { run_id, total, .. } => {
            println!("Run #{}: {} targets", run_id, total);
        }
        CrawlEvent::TargetFailed { target, error } => {
            println!("  ! {}: {}", target, error);
        }
        CrawlEvent::Progress { completed, total } => {
            let percent = (event.fraction().unwrap_or(0.0) * 100.0).round();
            println!("[{:>3}%] {}/{} targets", percent, completed, total);
        }
        CrawlEvent::Done(report) => render_report(report),
        CrawlEvent::Failed { run_id, error } => {
            println!("\nRun #{} failed: {}\n", run_id, error);
        }
        CrawlEvent::TargetStarted(_) | CrawlEvent::TargetFinished(_) => {}
    }
}

fn render_report(report: &RunReport) {
    if report.cancelled {
        println!("\nRun cancelled.");
    } else {
        println!("\nParsing complete.");
    }
    println!(
        "  {} accounts fetched, {} accepted, {} new",
        report.total_fetched(),
        report.total_accepted(),
        report.total_inserted()
    );
    for target in report.failed_targets() {
        let errors: Vec<String> = target.errors.iter().map(|e| e.to_string()).collect();
        println!("  {}: {}", target.target, errors.join("; "));
    }
    println!();
}

fn print_current_statistics(store: &SharedStore) -> Result<(), Box<dyn std::error::Error>> {
    let stats = {
        let guard = lock_store(store)?;
        load_statistics(&*guard)?
    };
    print_statistics(&stats);
    Ok(())
}
