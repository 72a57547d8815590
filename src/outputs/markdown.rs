//! Markdown report rendering.
//!
//! One report per run:
//!
//! ```text
//! # US Financial News Summary
//!
//! Generated on: 2025-11-03 12:30:00
//!
//! ## <title>
//!
//! - **Source**: CNBC
//! - **Published**: 2025-11-03 14:32:00
//! - **URL**: https://...
//!
//! <body>
//!
//! ---
//! ```

use crate::dates::format_output_date;
use crate::error::Result;
use crate::models::Article;
use chrono::{DateTime, Local};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

const REPORT_TITLE: &str = "US Financial News Summary";

/// `{prefix}_{yyyymmdd}-{hhmm}.md`, e.g. `US_News_20251103-1230.md`.
pub fn generate_filename(prefix: &str, now: &DateTime<Local>) -> String {
    format!("{prefix}_{}.md", now.format("%Y%m%d-%H%M"))
}

fn escape_inline(line: &str, out: &mut String) {
    for c in line.chars() {
        if matches!(c, '\\' | '`' | '*' | '_' | '#' | '[' | ']' | '<' | '>' | '|') {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Backslash-escape characters Markdown would otherwise interpret, plus the
/// list, ordered-list and setext markers that only matter at line start.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            escaped.push('\n');
        }
        let rest = line.trim_start();
        escaped.push_str(&line[..line.len() - rest.len()]);

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let after_digits = &rest[digits..];
        if rest.starts_with(['-', '+', '=']) {
            escaped.push('\\');
        } else if digits > 0 && after_digits.starts_with(['.', ')']) {
            escaped.push_str(&rest[..digits]);
            escaped.push('\\');
            escape_inline(after_digits, &mut escaped);
            continue;
        }
        escape_inline(rest, &mut escaped);
    }
    escaped
}

pub fn render_article(out: &mut String, article: &Article) {
    writeln!(out, "## {}\n", escape_markdown(&article.title)).ok();
    writeln!(out, "- **Source**: {}", escape_markdown(&article.source)).ok();
    writeln!(out, "- **Published**: {}", format_output_date(&article.publication_date)).ok();
    writeln!(out, "- **URL**: {}\n", article.url).ok();
    writeln!(out, "{}\n", escape_markdown(&article.content)).ok();
    writeln!(out, "---\n").ok();
}

pub fn render_report(articles: &[Article], generated_at: &DateTime<Local>) -> String {
    let mut out = String::new();
    writeln!(out, "# {REPORT_TITLE}\n").ok();
    writeln!(out, "Generated on: {}\n", generated_at.format("%Y-%m-%d %H:%M:%S")).ok();
    for article in articles {
        render_article(&mut out, article);
    }
    out
}

/// Render `articles` and write them to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn write_report(articles: &[Article], path: &Path) -> Result<PathBuf> {
    let markdown = render_report(articles, &Local::now());
    fs::write(path, markdown).await?;
    info!("Wrote Markdown report");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::extracted;
    use chrono::{TimeZone, Utc};

    fn dated(title: &str, content: &str, url: &str, source: &str, hour: u32) -> Article {
        let date = Utc.with_ymd_and_hms(2025, 11, 3, hour, 15, 0).unwrap();
        Article::new(extracted(title, content, url, source), date).unwrap()
    }

    #[test]
    fn test_generate_filename() {
        let now = Local.with_ymd_and_hms(2025, 11, 3, 9, 5, 0).unwrap();
        assert_eq!(generate_filename("US_News", &now), "US_News_20251103-0905.md");
    }

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("S&P 500 *rallies*"), r"S&P 500 \*rallies\*");
        assert_eq!(escape_markdown("#1 pick_of [day]"), r"\#1 pick\_of \[day\]");
        assert_eq!(escape_markdown(r"a\b`c"), r"a\\b\`c");
        assert_eq!(escape_markdown("plain text"), "plain text");
        assert_eq!(escape_markdown("<b>bold</b> | x"), r"\<b\>bold\</b\> \| x");
    }

    #[test]
    fn test_escape_markdown_block_markers() {
        assert_eq!(escape_markdown("> 1. Shares rose"), r"\> 1. Shares rose");
        assert_eq!(escape_markdown("1. Shares rose"), r"1\. Shares rose");
        assert_eq!(escape_markdown("2025) was a year"), r"2025\) was a year");
        assert_eq!(escape_markdown("- down 3%"), r"\- down 3%");
        assert_eq!(escape_markdown("+ up 2%"), r"\+ up 2%");
        assert_eq!(escape_markdown("==="), r"\===");
        assert_eq!(escape_markdown("first\n  - second"), "first\n  \\- second");
        assert_eq!(escape_markdown("Up 1.5% - again"), "Up 1.5% - again");
        assert_eq!(escape_markdown("500 points"), "500 points");
    }

    #[test]
    fn test_rendered_body_is_a_plain_paragraph() {
        let a = dated(
            "Futures slip before the open",
            "> 1. Shares rose after the company raised guidance for the full fiscal year.",
            "https://www.cnbc.com/2025/11/03/futures.html",
            "CNBC",
            9,
        );
        let md = render_report(&[a], &Local::now());
        assert!(md.contains("\n\\> 1. Shares rose after"));
        assert!(!md.contains("\n> "));
    }

    #[test]
    fn test_render_escapes_title_but_not_url() {
        let a = dated(
            "Stocks *surge* on earnings",
            "Shares of the company rose after results beat every estimate on the street.",
            "https://www.cnbc.com/2025/11/03/stocks_surge.html",
            "CNBC",
            14,
        );
        let md = render_report(&[a], &Local::now());
        assert!(md.contains(r"## Stocks \*surge\* on earnings"));
        assert!(md.contains("- **URL**: https://www.cnbc.com/2025/11/03/stocks_surge.html"));
        assert!(md.contains("- **Published**: 2025-11-03 14:15:00"));
    }

    #[tokio::test]
    async fn test_written_report_contains_each_field_once() {
        let articles = vec![
            dated(
                "Fed holds rates steady",
                "The Federal Reserve left its benchmark rate unchanged on Monday afternoon.",
                "https://www.cnn.com/2025/11/03/business/fed-decision",
                "CNN",
                14,
            ),
            dated(
                "Treasury yields climb",
                "Bond yields rose across the curve after a stronger than expected payrolls print.",
                "https://www.cnbc.com/2025/11/03/treasury-yields.html",
                "CNBC",
                16,
            ),
            dated(
                "#1 AI_stock of the [week]",
                "- Shares of the *top* chip maker climbed again as <orders> beat forecasts.",
                "https://www.cnbc.com/2025/11/03/ai_stock.html",
                "CNBC",
                18,
            ),
        ];
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(generate_filename("US_News", &Local::now()));

        let written = write_report(&articles, &path).await.unwrap();
        let text = std::fs::read_to_string(&written).unwrap();

        assert!(text.starts_with("# US Financial News Summary\n"));
        for a in &articles {
            // Text fields are stored escaped; URLs and dates verbatim.
            for field in [
                escape_markdown(&a.title),
                escape_markdown(&a.content),
                a.url.clone(),
                format_output_date(&a.publication_date),
            ] {
                assert_eq!(text.matches(field.as_str()).count(), 1, "field {field:?}");
            }
            let same_source = articles.iter().filter(|b| b.source == a.source).count();
            assert_eq!(text.matches(&format!("**Source**: {}\n", a.source)).count(), same_source);
        }
        assert!(text.contains(r"## \#1 AI\_stock of the \[week\]"));
        assert!(!text.contains("#1 AI_stock"));
        assert_eq!(text.matches("\n---\n").count(), 3);
    }
}
