//! HTTP fetching with exponential backoff retry.
//!
//! - [`RetryPolicy`]: the retry loop as a value. The operation and the sleep
//!   function are parameters, so the schedule can be exercised without waiting.
//! - [`PageFetcher`]: the seam the scrapers fetch through.
//! - [`HttpFetcher`]: the `reqwest` implementation used at runtime.
//!
//! # Retry Strategy
//!
//! - `max_attempts` tries in total (`MAX_RETRIES`, default 3)
//! - Exponential backoff starting at 1 second: 1s, 2s, 4s...
//! - Delay capped at 30 seconds
//! - Transport failures, including a body that breaks off mid-read, are
//!   retried; HTTP error statuses are not
//! - Exhaustion is logged at critical severity and yields `None`

use crate::config::Config;
use crate::error::{ErrorKind, Result, ScrapeError, Severity, status_severity};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0 Safari/537.36 us_financial_news/0.1";
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay after the first failure; doubles with each attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay after the failed attempt numbered `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    /// Run `op` until it succeeds or the attempts are spent, calling `sleep`
    /// between attempts.
    pub async fn run_with<T, E, Op, Fut, S, SFut>(&self, label: &str, mut op: Op, sleep: S) -> Option<T>
    where
        E: fmt::Display,
        Op: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let total_t0 = Instant::now();

        for attempt in 0..self.max_attempts {
            let attempt_t0 = Instant::now();
            match op().await {
                Ok(value) => return Some(value),
                Err(e) => {
                    let last = attempt + 1 == self.max_attempts;
                    warn!(
                        label,
                        attempt = attempt + 1,
                        max = self.max_attempts,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64,
                        error = %e,
                        "Request attempt failed"
                    );
                    if !last {
                        let delay = self.backoff(attempt);
                        debug!(label, ?delay, "Backing off");
                        sleep(delay).await;
                    }
                }
            }
        }

        crate::log_at_severity!(
            Severity::Critical,
            label,
            kind = %ErrorKind::Network,
            attempts = self.max_attempts,
            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
            "Request failed after all retries"
        );
        None
    }

    /// [`run_with`](Self::run_with) using `tokio::time::sleep`.
    pub async fn run<T, E, Op, Fut>(&self, label: &str, op: Op) -> Option<T>
    where
        E: fmt::Display,
        Op: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.run_with(label, op, tokio::time::sleep).await
    }
}

/// Source of raw page bodies.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return its body.
    ///
    /// # Errors
    ///
    /// Returns a network-kind [`ScrapeError`] when the page is unreachable or
    /// answers with a non-2xx status.
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// Shared HTTP client profile: browser-like user agent, HTML `Accept`,
/// English `Accept-Language` and the configured per-request timeout.
pub fn build_client(config: &Config) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(config.request_timeout)
        .build()?;
    Ok(client)
}

/// Status and body of one completed GET. The body is left empty for non-2xx
/// statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub status: StatusCode,
    pub body: String,
}

pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher").field("policy", &self.policy).finish()
    }
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_policy(
            build_client(config)?,
            RetryPolicy::new(config.max_retries, Duration::from_secs(1)),
        ))
    }

    pub fn with_policy(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    async fn get_once(&self, url: &str) -> reqwest::Result<FetchedPage> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Ok(FetchedPage {
                status,
                body: String::new(),
            });
        }
        let body = response.text().await?;
        Ok(FetchedPage { status, body })
    }

    /// GET `url` with retry; each attempt covers the headers and the full
    /// body. Any HTTP status counts as a response; `None` means every attempt
    /// failed at the transport level.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Option<FetchedPage> {
        self.policy.run(url, || self.get_once(url)).await
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let Some(page) = self.fetch(url).await else {
            return Err(ScrapeError::Unavailable {
                url: url.to_string(),
                attempts: self.policy.max_attempts,
            });
        };

        let status = page.status;
        if !status.is_success() {
            crate::log_at_severity!(
                status_severity(status),
                %url,
                status = status.as_u16(),
                kind = %ErrorKind::Network,
                "HTTP error status"
            );
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status,
            });
        }

        debug!(%url, bytes = page.body.len(), "Fetched page");
        Ok(page.body)
    }
}
