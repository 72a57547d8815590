//! Command-line interface definitions.
//!
//! Only run-level switches live here; everything about sources, pacing and
//! filtering comes from the environment (see [`crate::config`]).

use clap::Parser;
use std::path::PathBuf;

/// Scrape recent CNN Business and CNBC coverage into one Markdown report.
///
/// # Examples
///
/// ```sh
/// # Report named after OUTPUT_FILE_PREFIX and the current time
/// us_financial_news
///
/// # Explicit report path, debug logging and a JSON run summary
/// us_financial_news -o reports/today.md -v --summary reports/today.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path of the Markdown report (default: {OUTPUT_FILE_PREFIX}_{yyyymmdd}-{hhmm}.md)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Also write run statistics as JSON to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,
}
