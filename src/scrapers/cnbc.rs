//! CNBC Business scraper profile.
//!
//! CNBC article URLs end in `.html` and usually carry a `/yyyy/mm/dd/` path.
//! Live blogs, quote pages and "playbook" newsletters are skipped. Extracted
//! pages go through the content cache.

use super::{SiteProfile, SiteScraper};
use crate::config::Config;

pub static PROFILE: SiteProfile = SiteProfile {
    name: "CNBC",
    date_key: "cnbc",
    path_patterns: &["id-", ".html", "/articles/", "/news/", "/investing/", "/economy/", "/finance/"],
    skip_patterns: &[
        ".jpg", ".jpeg", ".png", ".gif", ".svg", ".css", ".js", "video/", "videos/", "gallery",
        "newsletter", "author/", "authors/", "tag/", "tags/", "#", "mailto:", "search?", "search/",
        "topic/", "topics/", "category/", "categories/", ".mp4", ".mov", ".avi", ".wmv", ".zip",
        ".pdf", ".doc", ".docx", "playbook", "/live/", "live-updates",
        "/quotes/",
    ],
    date_selectors: &["time", ".date", ".metadata__date", r#"[data-testid="published-timestamp"]"#],
    content_selectors: &[
        ".ArticleBody-articleBody",
        ".renderedcontent",
        ".group",
        ".ArticleLayout-articleBody",
        r#"[data-module="ArticleBody"]"#,
        ".ArticleBody",
        ".PostContent",
        ".post-content",
        ".article-content",
        "article",
    ],
    use_cache: true,
};

pub fn scraper(config: &Config) -> SiteScraper {
    SiteScraper::new(&PROFILE, config.cnbc_business_url.clone(), config.max_articles_per_source)
}
