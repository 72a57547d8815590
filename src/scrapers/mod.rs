//! News source scrapers.
//!
//! Each source is described by a static [`SiteProfile`] and scraped by the
//! shared [`SiteScraper`] in two phases:
//!
//! 1. **Indexing**: walk the listing page's anchors and keep article links
//! 2. **Extraction**: pull title, raw date and body from each article page
//!
//! # Supported Sources
//!
//! | Source | Module | Listing page | Cached |
//! |--------|--------|--------------|--------|
//! | CNN Business | [`cnn`] | `https://www.cnn.com/business` | no |
//! | CNBC Business | [`cnbc`] | `https://www.cnbc.com/business/` | yes |
//!
//! Parsing is synchronous (`scraper::Html` is not `Send`); the async wrappers
//! only fetch and then hand the body to the parser. Pacing, retry and caching
//! belong to the pipeline that drives the scraper.

pub mod cnbc;
pub mod cnn;

use crate::error::{ErrorKind, Result, ScrapeError};
use crate::fetch::PageFetcher;
use crate::models::{ArticleLink, ExtractedContent};
use crate::utils::{collapse_whitespace, truncate_for_log};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static DATE_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d{4}/\d{2}/\d{2}/").expect("date path regex"));

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));
static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").expect("h1 selector"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("p selector"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("body selector"));

const MIN_LINK_TEXT: usize = 15;
const MIN_TITLE: usize = 10;
const MIN_CONTAINER_PARAGRAPH: usize = 20;
const MIN_GENERIC_PARAGRAPH: usize = 30;
const MAX_GENERIC_PARAGRAPHS: usize = 10;
const MIN_BODY_LINE: usize = 50;
const MAX_BODY_LINES: usize = 15;
const MIN_CONTENT: usize = 50;

const URL_PREFIXES: [&str; 4] = ["http", "/", "./", "../"];
const TITLE_FALLBACKS: [&str; 2] = ["[data-module-title]", "title"];
const GENERIC_CONTAINERS: [&str; 5] = ["main", ".main-content", "#main", ".content", "#content"];

/// Static description of one news source.
#[derive(Debug)]
pub struct SiteProfile {
    /// Display name written into every article, e.g. `"CNN"`.
    pub name: &'static str,
    /// Key selecting the date prefix list in [`crate::dates`].
    pub date_key: &'static str,
    /// Substrings marking an href as an article link.
    pub path_patterns: &'static [&'static str],
    /// Substrings that disqualify an href (media, navigation, queries, fragments).
    pub skip_patterns: &'static [&'static str],
    pub date_selectors: &'static [&'static str],
    /// Article body containers, most specific first.
    pub content_selectors: &'static [&'static str],
    /// Whether extracted pages go through the content cache.
    pub use_cache: bool,
}

/// Scraper bound to one profile and listing page.
#[derive(Debug, Clone)]
pub struct SiteScraper {
    profile: &'static SiteProfile,
    listing_url: String,
    max_articles: usize,
}

fn parse_selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(css, error = %e, "Skipping invalid selector");
            None
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().join(" "))
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let selector = parse_selector(css)?;
    document
        .select(&selector)
        .map(element_text)
        .find(|text| !text.is_empty())
}

impl SiteScraper {
    pub fn new(profile: &'static SiteProfile, listing_url: impl Into<String>, max_articles: usize) -> Self {
        Self {
            profile,
            listing_url: listing_url.into(),
            max_articles,
        }
    }

    pub fn profile(&self) -> &'static SiteProfile {
        self.profile
    }

    pub fn name(&self) -> &'static str {
        self.profile.name
    }

    /// Root of the listing page's domain, used to resolve relative links.
    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.listing_url)?.join("/")?)
    }

    /// Whether an href looks like one of this source's article links.
    pub fn accepts_url(&self, href: &str) -> bool {
        let lower = href.to_lowercase();
        let article_like = self.profile.path_patterns.iter().any(|p| lower.contains(p))
            || DATE_PATH_RE.is_match(href);
        let excluded = self.profile.skip_patterns.iter().any(|p| lower.contains(p));
        article_like && !excluded && URL_PREFIXES.iter().any(|p| href.starts_with(p))
    }

    /// Candidate links from a listing page, in document order, capped at
    /// `max_articles`.
    pub fn parse_listing(&self, html: &str, base: &Url) -> Vec<ArticleLink> {
        let document = Html::parse_document(html);
        let mut seen: HashSet<&str> = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&ANCHOR) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if seen.contains(href) || !self.accepts_url(href) {
                continue;
            }
            let title = element_text(element);
            if title.chars().count() <= MIN_LINK_TEXT {
                continue;
            }
            let Ok(resolved) = base.join(href) else {
                debug!(href, "Unresolvable link");
                continue;
            };

            seen.insert(href);
            debug!(source = self.profile.name, title = %truncate_for_log(&title, 50), "Found article link");
            links.push(ArticleLink {
                title,
                url: resolved.to_string(),
            });

            if links.len() >= self.max_articles {
                info!(source = self.profile.name, max = self.max_articles, "Reached article limit");
                break;
            }
        }
        links
    }

    /// Extract title, raw date and body text from an article page.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Parsing`] when no title is found or the cleaned
    /// body is shorter than 50 characters.
    pub fn parse_article(&self, html: &str, url: &str) -> Result<ExtractedContent> {
        let document = Html::parse_document(html);

        let title = self.extract_title(&document).ok_or_else(|| ScrapeError::Parsing {
            element: "title".to_string(),
            url: url.to_string(),
        })?;
        let raw_date = self.extract_date(&document);
        let content = self.extract_body(&document);

        if content.chars().count() < MIN_CONTENT {
            return Err(ScrapeError::Parsing {
                element: "article body".to_string(),
                url: url.to_string(),
            });
        }

        Ok(ExtractedContent {
            title,
            content,
            raw_date,
            url: url.to_string(),
            source: self.profile.name.to_string(),
        })
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        let h1 = document.select(&H1).map(element_text).find(|t| !t.is_empty());
        match h1 {
            Some(title) if title.chars().count() >= MIN_TITLE => Some(title),
            short => TITLE_FALLBACKS
                .iter()
                .find_map(|css| first_text(document, css))
                .or(short),
        }
    }

    fn extract_date(&self, document: &Html) -> Option<String> {
        self.profile.date_selectors.iter().find_map(|css| {
            let selector = parse_selector(css)?;
            let element = document.select(&selector).next()?;
            let raw = element
                .value()
                .attr("datetime")
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| element_text(element));
            Some(raw).filter(|d| !d.is_empty())
        })
    }

    fn extract_body(&self, document: &Html) -> String {
        for css in self.profile.content_selectors {
            let Some(selector) = parse_selector(css) else {
                continue;
            };
            let mut parts = Vec::new();
            for container in document.select(&selector) {
                let mut paragraphs = container.select(&PARAGRAPH).peekable();
                if paragraphs.peek().is_none() {
                    parts.push(element_text(container));
                } else {
                    parts.extend(paragraphs.map(element_text));
                }
            }
            parts.retain(|p| p.chars().count() > MIN_CONTAINER_PARAGRAPH);
            if !parts.is_empty() {
                return collapse_whitespace(&parts.join(" "));
            }
        }

        for css in GENERIC_CONTAINERS {
            let Some(selector) = parse_selector(css) else {
                continue;
            };
            let Some(container) = document.select(&selector).next() else {
                continue;
            };
            let content = container
                .select(&PARAGRAPH)
                .map(element_text)
                .filter(|p| p.chars().count() > MIN_GENERIC_PARAGRAPH)
                .take(MAX_GENERIC_PARAGRAPHS)
                .join(" ");
            if !content.is_empty() {
                return collapse_whitespace(&content);
            }
        }

        let body_text: String = match document.select(&BODY).next() {
            Some(body) => body.text().collect(),
            None => document.root_element().text().collect(),
        };
        let lines = body_text
            .lines()
            .map(str::trim)
            .filter(|line| line.chars().count() > MIN_BODY_LINE)
            .take(MAX_BODY_LINES)
            .join(" ");
        collapse_whitespace(&lines)
    }

    /// Fetch the listing page and collect candidate links.
    #[instrument(level = "info", skip_all, fields(source = self.profile.name, url = %self.listing_url))]
    pub async fn list_articles(&self, fetcher: &dyn PageFetcher) -> Result<Vec<ArticleLink>> {
        let base = self.base_url()?;
        let html = fetcher.fetch_page(&self.listing_url).await?;
        let links = self.parse_listing(&html, &base);
        info!(count = links.len(), "Indexed article links");
        Ok(links)
    }

    /// Fetch and parse one article page. Failures are logged and yield `None`.
    #[instrument(level = "debug", skip(self, fetcher), fields(source = self.profile.name))]
    pub async fn extract_content(&self, fetcher: &dyn PageFetcher, url: &str) -> Option<ExtractedContent> {
        let html = match fetcher.fetch_page(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%url, kind = %e.kind(), error = %e, "Article fetch failed");
                return None;
            }
        };
        match self.parse_article(&html, url) {
            Ok(content) => {
                debug!(%url, title = %truncate_for_log(&content.title, 50), "Extracted article");
                Some(content)
            }
            Err(e) => {
                error!(%url, kind = %ErrorKind::Parsing, error = %e, "Insufficient content extracted");
                None
            }
        }
    }
}
