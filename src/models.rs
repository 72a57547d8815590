//! Data models for scraped articles and run results.
//!
//! This module defines the records that flow through the pipeline:
//! - [`ArticleLink`]: a candidate link found on a listing page
//! - [`ExtractedContent`]: structured fields pulled from an article page
//! - [`Article`]: a validated record, the only form that reaches the output
//! - [`ScrapingResult`]: the merged outcome of one run, with its [`ErrorRecord`]s
//!
//! `Article` is only built through [`Article::new`], which rejects records with
//! empty required fields, so later stages never see partially-filled data.

use crate::dedup::content_hash;
use crate::error::{Result, ScrapeError};
use crate::utils::url_id;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// A candidate article link found on a source's listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    /// Visible anchor text.
    pub title: String,
    /// Absolute article URL.
    pub url: String,
}

/// Fields extracted from an article page, before date parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    /// Cleaned body text (whitespace collapsed).
    pub content: String,
    /// Raw date string as found on the page, if any.
    pub raw_date: Option<String>,
    pub url: String,
    /// Display name of the source, e.g. `"CNN"`.
    pub source: String,
}

/// Processing state carried as metadata; not used for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Pending,
    Processed,
    Filtered,
    Failed,
}

/// A validated news article.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// Per-run identifier derived from the URL.
    pub id: String,
    pub title: String,
    pub content: String,
    pub url: String,
    pub source: String,
    /// Publication time normalized to UTC.
    pub publication_date: DateTime<Utc>,
    pub scraped_at: Option<DateTime<Utc>>,
    pub status: ArticleStatus,
    pub quality_score: Option<f32>,
    /// SHA-256 of the normalized content.
    pub similarity_hash: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl Article {
    /// Build an article from extracted content and its parsed date.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Validation`] if title, content, URL or source
    /// is blank.
    pub fn new(extracted: ExtractedContent, publication_date: DateTime<Utc>) -> Result<Self> {
        let article = Article {
            id: url_id(&extracted.url),
            similarity_hash: Some(content_hash(&extracted.content)),
            title: extracted.title,
            content: extracted.content,
            url: extracted.url,
            source: extracted.source,
            publication_date,
            scraped_at: None,
            status: ArticleStatus::Pending,
            quality_score: None,
            processing_time_ms: None,
        };
        article.validate()?;
        Ok(article)
    }

    /// Check the required-field invariant.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title", &self.title),
            ("content", &self.content),
            ("url", &self.url),
            ("source", &self.source),
        ] {
            if value.trim().is_empty() {
                return Err(ScrapeError::Validation(format!("missing {field}")));
            }
        }
        Ok(())
    }
}

/// One failed source pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub source: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(source: impl Into<String>, error: impl ToString) -> Self {
        Self {
            source: source.into(),
            error: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Lifecycle of one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    /// At least one source failed; includes the case where all did.
    PartialFailure,
    Success,
}

/// Merged outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapingResult {
    pub articles: Vec<Article>,
    pub errors: Vec<ErrorRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub state: RunState,
    /// Links found across all listing pages.
    pub candidates: usize,
    pub duplicates_removed: usize,
}

/// Summary numbers for a run, written by `--summary`.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatistics {
    pub total_articles: usize,
    pub total_errors: usize,
    pub candidates: usize,
    pub duplicates_removed: usize,
    pub duration_seconds: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub state: RunState,
    pub source_stats: BTreeMap<String, usize>,
}

impl ScrapingResult {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Success
    }

    pub fn statistics(&self) -> RunStatistics {
        let mut source_stats = BTreeMap::new();
        for article in &self.articles {
            *source_stats.entry(article.source.clone()).or_insert(0) += 1;
        }
        RunStatistics {
            total_articles: self.articles.len(),
            total_errors: self.errors.len(),
            candidates: self.candidates,
            duplicates_removed: self.duplicates_removed,
            duration_seconds: self.duration.as_secs_f64(),
            start_time: self.started_at,
            end_time: self.finished_at,
            state: self.state,
            source_stats,
        }
    }
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn extracted(title: &str, content: &str, url: &str, source: &str) -> ExtractedContent {
        ExtractedContent {
            title: title.to_string(),
            content: content.to_string(),
            raw_date: None,
            url: url.to_string(),
            source: source.to_string(),
        }
    }

    pub(crate) fn article(title: &str, content: &str, url: &str, source: &str) -> Article {
        Article::new(extracted(title, content, url, source), Utc::now()).unwrap()
    }

    #[test]
    fn test_article_new_fills_derived_fields() {
        let date = Utc.with_ymd_and_hms(2025, 11, 3, 9, 15, 30).unwrap();
        let a = Article::new(
            extracted(
                "Fed holds rates steady",
                "The Federal Reserve kept its benchmark rate unchanged on Wednesday.",
                "https://www.cnbc.com/2025/11/03/fed.html",
                "CNBC",
            ),
            date,
        )
        .unwrap();
        assert_eq!(a.publication_date, date);
        assert_eq!(a.status, ArticleStatus::Pending);
        assert_eq!(a.id, url_id("https://www.cnbc.com/2025/11/03/fed.html"));
        assert_eq!(a.similarity_hash.as_deref().map(str::len), Some(64));
    }

    #[test]
    fn test_article_new_rejects_blank_fields() {
        let date = Utc::now();
        for (title, content, url, source) in [
            ("", "body", "https://x.com/a", "CNN"),
            ("Title", "  ", "https://x.com/a", "CNN"),
            ("Title", "body", "", "CNN"),
            ("Title", "body", "https://x.com/a", ""),
        ] {
            let err = Article::new(extracted(title, content, url, source), date).unwrap_err();
            assert!(matches!(err, ScrapeError::Validation(_)));
        }
    }

    #[test]
    fn test_statistics_counts_per_source() {
        let now = Utc::now();
        let result = ScrapingResult {
            articles: vec![
                article("A headline here", "content a", "https://cnn.com/a", "CNN"),
                article("B headline here", "content b", "https://cnn.com/b", "CNN"),
                article("C headline here", "content c", "https://cnbc.com/c", "CNBC"),
            ],
            errors: vec![],
            started_at: now,
            finished_at: now,
            duration: Duration::from_millis(1500),
            state: RunState::Success,
            candidates: 5,
            duplicates_removed: 1,
        };
        let stats = result.statistics();
        assert_eq!(stats.total_articles, 3);
        assert_eq!(stats.source_stats.get("CNN"), Some(&2));
        assert_eq!(stats.source_stats.get("CNBC"), Some(&1));
        assert_eq!(stats.duration_seconds, 1.5);
        assert!(result.is_success());
    }

    #[test]
    fn test_result_serialization() {
        let now = Utc::now();
        let result = ScrapingResult {
            articles: vec![],
            errors: vec![ErrorRecord::new("CNBC", "boom")],
            started_at: now,
            finished_at: now,
            duration: Duration::from_secs(2),
            state: RunState::PartialFailure,
            candidates: 0,
            duplicates_removed: 0,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["state"], "partial_failure");
        assert_eq!(json["duration"], 2.0);
        assert_eq!(json["errors"][0]["source"], "CNBC");
    }
}
