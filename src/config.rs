//! Runtime configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is read first when present; real
//! environment variables win over it. Every setting is optional:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CNN_BUSINESS_URL` | `https://www.cnn.com/business` |
//! | `CNBC_BUSINESS_URL` | `https://www.cnbc.com/business/` |
//! | `RATE_LIMIT_MIN_DELAY` | `3.0` seconds |
//! | `RATE_LIMIT_MAX_DELAY` | `5.0` seconds |
//! | `DATE_FILTER_HOURS` | `72` |
//! | `MAX_RETRIES` | `3` |
//! | `CONCURRENT_TASKS_LIMIT` | `3` |
//! | `MAX_ARTICLES_PER_SOURCE` | `10` |
//! | `CACHE_TTL_HOURS` | `24` |
//! | `OUTPUT_FILE_PREFIX` | `US_News` |
//! | `OUTPUT_RETENTION_DAYS` | `30` |
//! | `REQUEST_TIMEOUT_SECS` | `30` |
//! | `LOG_FILE` | `scraper.log` |

use crate::error::{Result, ScrapeError};
use chrono::TimeDelta;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub cnn_business_url: String,
    pub cnbc_business_url: String,
    pub rate_limit_min_delay: f64,
    pub rate_limit_max_delay: f64,
    pub date_filter_hours: i64,
    pub max_retries: u32,
    pub concurrent_tasks_limit: usize,
    pub max_articles_per_source: usize,
    pub cache_ttl_hours: i64,
    pub output_file_prefix: String,
    pub output_retention_days: i64,
    pub request_timeout: Duration,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cnn_business_url: "https://www.cnn.com/business".to_string(),
            cnbc_business_url: "https://www.cnbc.com/business/".to_string(),
            rate_limit_min_delay: 3.0,
            rate_limit_max_delay: 5.0,
            date_filter_hours: 72,
            max_retries: 3,
            concurrent_tasks_limit: 3,
            max_articles_per_source: 10,
            cache_ttl_hours: 24,
            output_file_prefix: "US_News".to_string(),
            output_retention_days: 30,
            request_timeout: Duration::from_secs(30),
            log_file: "scraper.log".to_string(),
        }
    }
}

impl Config {
    /// Load `.env` (if any) and read the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep their
    /// defaults; malformed values are configuration errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let string = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let config = Config {
            cnn_business_url: string("CNN_BUSINESS_URL", defaults.cnn_business_url),
            cnbc_business_url: string("CNBC_BUSINESS_URL", defaults.cnbc_business_url),
            rate_limit_min_delay: parse_or(&lookup, "RATE_LIMIT_MIN_DELAY", defaults.rate_limit_min_delay)?,
            rate_limit_max_delay: parse_or(&lookup, "RATE_LIMIT_MAX_DELAY", defaults.rate_limit_max_delay)?,
            date_filter_hours: parse_or(&lookup, "DATE_FILTER_HOURS", defaults.date_filter_hours)?,
            max_retries: parse_or(&lookup, "MAX_RETRIES", defaults.max_retries)?,
            concurrent_tasks_limit: parse_or(&lookup, "CONCURRENT_TASKS_LIMIT", defaults.concurrent_tasks_limit)?,
            max_articles_per_source: parse_or(&lookup, "MAX_ARTICLES_PER_SOURCE", defaults.max_articles_per_source)?,
            cache_ttl_hours: parse_or(&lookup, "CACHE_TTL_HOURS", defaults.cache_ttl_hours)?,
            output_file_prefix: string("OUTPUT_FILE_PREFIX", defaults.output_file_prefix),
            output_retention_days: parse_or(&lookup, "OUTPUT_RETENTION_DAYS", defaults.output_retention_days)?,
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            log_file: string("LOG_FILE", defaults.log_file),
        };

        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if !(self.rate_limit_min_delay >= 0.0
            && self.rate_limit_min_delay <= self.rate_limit_max_delay
            && Duration::try_from_secs_f64(self.rate_limit_max_delay).is_ok())
        {
            return Err(ScrapeError::Config(format!(
                "rate limit delays must satisfy 0 <= min <= max (got {} and {})",
                self.rate_limit_min_delay, self.rate_limit_max_delay
            )));
        }
        if self.max_retries == 0 {
            return Err(ScrapeError::Config("MAX_RETRIES must be at least 1".to_string()));
        }
        if self.concurrent_tasks_limit == 0 {
            return Err(ScrapeError::Config(
                "CONCURRENT_TASKS_LIMIT must be at least 1".to_string(),
            ));
        }
        span_check("DATE_FILTER_HOURS", self.date_filter_hours, TimeDelta::try_hours)?;
        span_check("CACHE_TTL_HOURS", self.cache_ttl_hours, TimeDelta::try_hours)?;
        span_check("OUTPUT_RETENTION_DAYS", self.output_retention_days, TimeDelta::try_days)?;
        Ok(())
    }

    pub fn rate_limit_delays(&self) -> (Duration, Duration) {
        (
            Duration::from_secs_f64(self.rate_limit_min_delay),
            Duration::from_secs_f64(self.rate_limit_max_delay),
        )
    }

    /// Warn about listing URLs that are not http(s). They are kept as-is; the
    /// affected source will fail and be reported in the run's error list.
    pub fn warn_on_invalid_urls(&self) {
        for (key, url) in [
            ("CNN_BUSINESS_URL", &self.cnn_business_url),
            ("CNBC_BUSINESS_URL", &self.cnbc_business_url),
        ] {
            if !is_http_url(url) {
                warn!(key, %url, "Invalid URL format in configuration");
            }
        }
    }

    pub fn log_summary(&self) {
        info!(
            cnn = %self.cnn_business_url,
            cnbc = %self.cnbc_business_url,
            min_delay = self.rate_limit_min_delay,
            max_delay = self.rate_limit_max_delay,
            window_hours = self.date_filter_hours,
            max_retries = self.max_retries,
            concurrency = self.concurrent_tasks_limit,
            per_source_cap = self.max_articles_per_source,
            "Loaded configuration"
        );
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ScrapeError::Config(format!("{key}={raw:?}: {e}"))),
    }
}

/// Reject negative spans and spans too large for `chrono` to represent.
fn span_check(key: &str, value: i64, to_delta: fn(i64) -> Option<TimeDelta>) -> Result<()> {
    if value < 0 {
        return Err(ScrapeError::Config(format!("{key} must not be negative (got {value})")));
    }
    if to_delta(value).is_none() {
        return Err(ScrapeError::Config(format!("{key}={value} is out of range")));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
