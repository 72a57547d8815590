//! Per-source pipelines and the run-level aggregator.
//!
//! A [`SourcePipeline`] takes one source from listing page to validated,
//! in-window articles. The [`Aggregator`] runs every pipeline as its own task,
//! turns failed or panicked tasks into [`ErrorRecord`]s, merges the survivors
//! in source order and de-duplicates the merged list once.

use crate::cache::ContentCache;
use crate::config::Config;
use crate::dates::{is_within_window, parse_article_date};
use crate::dedup::remove_duplicates;
use crate::error::{ErrorKind, Result, ScrapeError, Severity};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{Article, ArticleLink, ArticleStatus, ErrorRecord, ExtractedContent, RunState, ScrapingResult};
use crate::rate_limit::RateLimiter;
use crate::scrapers::{SiteScraper, cnbc, cnn};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// What one source produced.
#[derive(Debug, Default)]
pub struct SourceHarvest {
    /// Links found on the listing page.
    pub candidates: usize,
    pub articles: Vec<Article>,
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;

    /// Scrape the source. An `Err` fails the whole source; per-article
    /// problems are handled inside and never surface here.
    async fn scrape(&self) -> Result<SourceHarvest>;
}

/// Scraper plus the fetcher, limiter and optional cache that carry its traffic.
pub struct SourcePipeline {
    scraper: SiteScraper,
    fetcher: Arc<dyn PageFetcher>,
    limiter: Arc<RateLimiter>,
    cache: Option<Arc<ContentCache>>,
    window_hours: i64,
    concurrency: usize,
}

impl SourcePipeline {
    pub fn new(
        scraper: SiteScraper,
        fetcher: Arc<dyn PageFetcher>,
        limiter: Arc<RateLimiter>,
        cache: Option<Arc<ContentCache>>,
        window_hours: i64,
        concurrency: usize,
    ) -> Self {
        Self {
            scraper,
            fetcher,
            limiter,
            cache,
            window_hours,
            concurrency: concurrency.max(1),
        }
    }

    async fn extract(&self, link: &ArticleLink) -> Option<ExtractedContent> {
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&link.url)) {
            return Some(hit);
        }
        self.limiter.wait_if_needed().await;
        let content = self.scraper.extract_content(self.fetcher.as_ref(), &link.url).await?;
        if let Some(cache) = &self.cache {
            cache.insert(&link.url, content.clone());
        }
        Some(content)
    }

    async fn process(&self, link: ArticleLink) -> Option<Article> {
        let t0 = Instant::now();
        let content = self.extract(&link).await?;

        let date_key = self.scraper.profile().date_key;
        let Some(date) = parse_article_date(content.raw_date.as_deref(), date_key) else {
            debug!(
                url = %link.url,
                raw_date = ?content.raw_date,
                kind = %ErrorKind::DateParse,
                "Unparsable publication date"
            );
            return None;
        };
        if !is_within_window(Some(date), self.window_hours) {
            debug!(url = %link.url, %date, hours = self.window_hours, "Outside recency window");
            return None;
        }

        let mut article = match Article::new(content, date) {
            Ok(article) => article,
            Err(e) => {
                error!(url = %link.url, kind = %ErrorKind::Validation, error = %e, "Rejected invalid article");
                return None;
            }
        };
        article.scraped_at = Some(Utc::now());
        article.status = ArticleStatus::Processed;
        article.processing_time_ms = Some(t0.elapsed().as_millis() as u64);
        Some(article)
    }
}

#[async_trait]
impl NewsSource for SourcePipeline {
    fn name(&self) -> &str {
        self.scraper.name()
    }

    #[instrument(level = "info", skip_all, fields(source = self.scraper.name()))]
    async fn scrape(&self) -> Result<SourceHarvest> {
        if let Some(cache) = &self.cache {
            let expired = cache.cleanup_expired(Utc::now());
            debug!(expired, cached = cache.len(), "Cache cleanup");
        }

        self.limiter.wait_if_needed().await;
        let links = self.scraper.list_articles(self.fetcher.as_ref()).await?;
        let candidates = links.len();

        let articles: Vec<Article> = stream::iter(links)
            .map(|link| self.process(link))
            .buffered(self.concurrency)
            .filter_map(std::future::ready)
            .collect()
            .await;

        info!(candidates, accepted = articles.len(), "Source pipeline finished");
        Ok(SourceHarvest { candidates, articles })
    }
}

pub struct Aggregator {
    sources: Vec<Arc<dyn NewsSource>>,
    state: RunState,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn NewsSource>>) -> Self {
        Self {
            sources,
            state: RunState::Idle,
        }
    }

    /// CNN and CNBC pipelines sharing one HTTP client. Each source gets its
    /// own rate limiter; only CNBC gets the content cache.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(config)?);
        let (min_delay, max_delay) = config.rate_limit_delays();
        let ttl = chrono::Duration::try_hours(config.cache_ttl_hours)
            .ok_or_else(|| ScrapeError::Config(format!("CACHE_TTL_HOURS={} is out of range", config.cache_ttl_hours)))?;
        let cache = Arc::new(ContentCache::new(ttl));

        let sources = [cnn::scraper(config), cnbc::scraper(config)]
            .into_iter()
            .map(|scraper| {
                let cache = scraper.profile().use_cache.then(|| Arc::clone(&cache));
                let pipeline = SourcePipeline::new(
                    scraper,
                    Arc::clone(&fetcher),
                    Arc::new(RateLimiter::new(min_delay, max_delay)),
                    cache,
                    config.date_filter_hours,
                    config.concurrent_tasks_limit,
                );
                Arc::new(pipeline) as Arc<dyn NewsSource>
            })
            .collect();
        Ok(Self::new(sources))
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run every source concurrently and merge the outcome. Never fails:
    /// source failures are recorded in the result.
    #[instrument(level = "info", skip_all, fields(sources = self.sources.len()))]
    pub async fn run(&mut self) -> ScrapingResult {
        self.state = RunState::Running;
        let started_at = Utc::now();
        let t0 = Instant::now();
        info!("Starting scraping run");

        let (names, handles): (Vec<String>, Vec<_>) = self
            .sources
            .iter()
            .map(|source| {
                let source = Arc::clone(source);
                let name = source.name().to_string();
                (name, tokio::spawn(async move { source.scrape().await }))
            })
            .unzip();

        let mut articles = Vec::new();
        let mut errors = Vec::new();
        let mut candidates = 0;

        for (name, outcome) in names.into_iter().zip(join_all(handles).await) {
            match outcome {
                Ok(Ok(harvest)) => {
                    info!(source = %name, candidates = harvest.candidates, articles = harvest.articles.len(), "Source succeeded");
                    candidates += harvest.candidates;
                    articles.extend(harvest.articles);
                }
                Ok(Err(e)) => {
                    error!(source = %name, kind = %e.kind(), error = %e, "Source failed");
                    errors.push(ErrorRecord::new(name, e));
                }
                Err(join_error) => {
                    crate::log_at_severity!(
                        Severity::Critical,
                        source = %name,
                        kind = %ErrorKind::Internal,
                        error = %join_error,
                        "Source task aborted"
                    );
                    errors.push(ErrorRecord::new(name, format!("task failed: {join_error}")));
                }
            }
        }

        let merged = articles.len();
        let articles = remove_duplicates(articles);
        let duplicates_removed = merged - articles.len();

        self.state = if errors.is_empty() {
            RunState::Success
        } else {
            RunState::PartialFailure
        };

        let result = ScrapingResult {
            articles,
            errors,
            started_at,
            finished_at: Utc::now(),
            duration: t0.elapsed(),
            state: self.state,
            candidates,
            duplicates_removed,
        };
        info!(
            articles = result.articles.len(),
            errors = result.errors.len(),
            duplicates_removed,
            elapsed_ms = result.duration.as_millis() as u64,
            state = ?result.state,
            "Scraping run finished"
        );
        result
    }
}
