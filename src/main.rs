//! Statute-Crawler main entry point
//!
//! This is the command-line interface for the statutes crawler. Each stage runs
//! as its own process against a shared SQLite database: `trigger` resets and
//! seeds a crawl cycle, `crawl` drains the frontier, and `scrape` turns stored
//! pages into links and chunks.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use statute_crawler::config::{load_config_with_hash, Config};
use statute_crawler::crawler::{
    reset, CrawlLoop, HttpFetcher, InterruptWatcher, Politeness, ResetSettings,
};
use statute_crawler::output::{inspect_page, load_statistics, print_inspection, print_statistics};
use statute_crawler::pipeline::ScrapeWorker;
use statute_crawler::scraper::RevisorScraper;
use statute_crawler::storage::{
    SqliteStorage, CHUNK_PATH_PREFIX, FRONTIER_QUEUE, RAW_EVENTS_QUEUE,
};
use statute_crawler::url::canonical_origin;
use tracing_subscriber::EnvFilter;

/// Statute-Crawler: a polite crawler and scraper for statutes pages
///
/// Crawls the statutes section of the revisor site one page at a time,
/// classifies each stored page, and turns statute sections into text chunks.
#[derive(Parser, Debug)]
#[command(name = "statute-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite statutes crawler and scraper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clear crawl state and seed the frontier
    Trigger {
        /// Seed URLs (defaults to the configured default seed)
        #[arg(value_name = "SEED")]
        seeds: Vec<String>,
    },

    /// Drain the frontier until interrupted
    Crawl,

    /// Scrape stored pages until interrupted
    Scrape,

    /// Classify a local HTML file and print what it yields
    Inspect {
        /// HTML file to inspect
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show queue and store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Trigger { seeds } => handle_trigger(&config, &seeds).await,
        Command::Crawl => handle_crawl(&config).await,
        Command::Scrape => handle_scrape(&config).await,
        Command::Inspect { file } => handle_inspect(&config, &file),
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("statute_crawler=info,warn"),
            1 => EnvFilter::new("statute_crawler=debug,info"),
            2 => EnvFilter::new("statute_crawler=trace,debug"),
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

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.storage.database_path);
    SqliteStorage::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn scraper_for(config: &Config) -> anyhow::Result<RevisorScraper> {
    Ok(RevisorScraper::with_origin(&config.site.origin)?)
}

/// Handles `trigger`: resets crawl state and seeds the frontier
async fn handle_trigger(config: &Config, seeds: &[String]) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let visibility = config.storage.visibility_timeout();

    let settings = ResetSettings {
        origin: canonical_origin(&config.site.origin)?,
        default_seed: config.site.default_seed.clone(),
        purge_wait: config.trigger.purge_wait(),
        purge_margin: config.trigger.purge_margin(),
        operation_timeout: config.crawler.operation_timeout(),
    };

    let seeded = reset(
        &storage.queue(FRONTIER_QUEUE, visibility),
        &storage.queue(RAW_EVENTS_QUEUE, visibility),
        &storage.seen_store(config.seen_store.batch_policy()),
        seeds,
        &settings,
    )
    .await?;

    println!("✓ Seeded {} URL(s)", seeded.len());
    Ok(())
}

/// Handles `crawl`: runs the crawl loop until a termination signal
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let visibility = config.storage.visibility_timeout();
    let max_receives = config.storage.max_receive_count;
    let fetcher = HttpFetcher::new(&config.user_agent, config.crawler.operation_timeout())?;

    let crawl_loop = CrawlLoop::new(
        Arc::new(storage.queue(FRONTIER_QUEUE, visibility).with_max_receive_count(max_receives)),
        Arc::new(storage.seen_store(config.seen_store.batch_policy())),
        Arc::new(storage.raw_store(Some(RAW_EVENTS_QUEUE))),
        Arc::new(fetcher),
        Arc::new(InterruptWatcher::spawn()),
    )
    .with_politeness(Politeness::from_config(&config.crawler))
    .with_operation_timeout(config.crawler.operation_timeout());

    let summary = crawl_loop.run().await;
    println!(
        "✓ Crawl stopped: {} stored, {} already seen, {} failed",
        summary.stored, summary.already_seen, summary.failed
    );
    Ok(())
}

/// Handles `scrape`: runs the scrape worker until a termination signal
async fn handle_scrape(config: &Config) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let visibility = config.storage.visibility_timeout();
    let max_receives = config.storage.max_receive_count;

    let worker = ScrapeWorker::new(
        Arc::new(storage.queue(RAW_EVENTS_QUEUE, visibility).with_max_receive_count(max_receives)),
        Arc::new(storage.raw_store(None)),
        Arc::new(storage.chunk_store(CHUNK_PATH_PREFIX)),
        Arc::new(storage.queue(FRONTIER_QUEUE, visibility)),
        Arc::new(scraper_for(config)?),
        Arc::new(InterruptWatcher::spawn()),
    )
    .with_idle_delay(config.crawler.idle_delay())
    .with_operation_timeout(config.crawler.operation_timeout());

    let scraped = worker.run().await;
    println!("✓ Scrape stopped after {} pages", scraped);
    Ok(())
}

/// Handles `inspect`: classifies a local file without touching any store
fn handle_inspect(config: &Config, file: &Path) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let inspection = inspect_page(&html, &scraper_for(config)?)
        .with_context(|| format!("Failed to scrape {}", file.display()))?;

    print_inspection(&inspection);
    Ok(())
}

/// Handles `stats`: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let storage = open_storage(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}
