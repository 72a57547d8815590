//! CNN Business scraper profile.
//!
//! Articles are linked from `https://www.cnn.com/business` with relative URLs
//! like `/2025/11/03/business/article-slug`, resolved against
//! `https://www.cnn.com/`.

use super::{SiteProfile, SiteScraper};
use crate::config::Config;

pub static PROFILE: SiteProfile = SiteProfile {
    name: "CNN",
    date_key: "cnn",
    path_patterns: &["/article", "/news", "/business/"],
    skip_patterns: &[
        ".jpg", ".jpeg", ".png", ".gif", ".svg", ".css", ".js", "video/", "videos/", "gallery",
        "newsletter", "author/", "authors/", "tag/", "tags/", "#", "mailto:", "search?", "search/",
        "topic/", "topics/", "category/", "categories/", ".mp4", ".mov", ".avi", ".wmv", ".zip",
        ".pdf", ".doc", ".docx",
    ],
    date_selectors: &["time", ".update-time", ".article__date", r#"[data-js-hook="update-time"]"#],
    content_selectors: &[
        r#"div[data-module="ArticleBody"]"#,
        ".article__content",
        r#"[data-editable="body"]"#,
        ".zn-body__paragraph",
        ".body-text",
        ".article-body",
        ".post-content",
        "article",
        ".entry-content",
        ".storytext",
    ],
    use_cache: false,
};

pub fn scraper(config: &Config) -> SiteScraper {
    SiteScraper::new(&PROFILE, config.cnn_business_url.clone(), config.max_articles_per_source)
}
