//! # US Financial News
//!
//! Scrapes recent business and markets coverage from CNN Business and CNBC,
//! keeps articles published inside a recency window, removes duplicates
//! across both sources and writes one Markdown report per run.
//!
//! ## Usage
//!
//! ```sh
//! us_financial_news --output reports/today.md --verbose
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: each source's listing page yields candidate links
//! 2. **Extraction**: article pages are fetched (rate limited, retried) and parsed
//! 3. **Filtering**: unparsable or out-of-window dates are dropped
//! 4. **Merging**: both sources run concurrently; the merged list is de-duplicated
//! 5. **Output**: stale reports are pruned and the new report is written

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod cache;
mod cli;
mod config;
mod dates;
mod dedup;
mod error;
mod fetch;
mod models;
mod outputs;
mod rate_limit;
mod scrapers;
mod utils;

use aggregator::Aggregator;
use cli::Cli;
use config::Config;
use models::ScrapingResult;
use outputs::{json, markdown, retention};
use utils::{ensure_writable_dir, truncate_for_log};

const PREVIEW_ARTICLES: usize = 5;

/// Log to stdout and append to `log_file`, both with RFC 3339 UTC timestamps
/// and the emitting module as target.
fn init_tracing(verbose: bool, log_file: &str) -> Result<(), Box<dyn Error>> {
    let filter = if verbose {
        EnvFilter::new("info,us_financial_news=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let stdout_layer = tfmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339());
    let file_layer = tfmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_timer(UtcTime::rfc_3339());

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;
    Ok(())
}

/// End-of-run report: counts, output path, a preview of the first articles
/// and every source error.
fn log_run_report(result: &ScrapingResult, written: Option<&Path>) {
    let stats = result.statistics();
    info!(
        articles = stats.total_articles,
        errors = stats.total_errors,
        candidates = stats.candidates,
        duplicates_removed = stats.duplicates_removed,
        duration_secs = stats.duration_seconds,
        output = %written.map(|p| p.display().to_string()).unwrap_or_else(|| "<none>".to_string()),
        "Run summary"
    );
    for (source, count) in &stats.source_stats {
        debug!(%source, count, "Articles per source");
    }
    for (i, article) in result.articles.iter().take(PREVIEW_ARTICLES).enumerate() {
        info!(
            index = i + 1,
            source = %article.source,
            title = %truncate_for_log(&article.title, 80),
            "Article"
        );
    }
    if !result.is_success() {
        warn!(failed_sources = result.errors.len(), "Run finished with source failures");
    }
    for record in &result.errors {
        warn!(source = %record.source, error = %record.error, at = %record.timestamp, "Source error");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(args.verbose, &config.log_file)?;

    let start_time = Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "us_financial_news starting up");
    debug!(?args, "Parsed CLI arguments");
    config.warn_on_invalid_urls();
    config.log_summary();

    let output_path = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(markdown::generate_filename(&config.output_file_prefix, &Local::now()))
    });
    let output_dir = output_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    // Early check: the report directory must be writable
    if let Err(e) = ensure_writable_dir(&output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let mut aggregator = Aggregator::from_config(&config)?;
    let result = tokio::select! {
        result = aggregator.run() => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; aborting run");
            return Err("interrupted".into());
        }
    };

    retention::prune_stale_reports(
        &output_dir,
        &config.output_file_prefix,
        config.output_retention_days,
        Local::now(),
    )
    .await;

    let written = if result.articles.is_empty() {
        warn!("No articles to write; skipping report");
        None
    } else {
        Some(markdown::write_report(&result.articles, &output_path).await?)
    };

    if let Some(summary_path) = &args.summary {
        if let Err(e) = json::write_summary(&result.statistics(), summary_path).await {
            error!(path = %summary_path.display(), error = %e, "Failed to write run summary");
        }
    }

    log_run_report(&result, written.as_deref());

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        state = ?aggregator.state(),
        "Execution complete"
    );
    Ok(())
}
