//! Small text and filesystem helpers shared across the pipeline.
//!
//! - Whitespace normalization used by the parsers and the deduplicator
//! - String truncation for log previews
//! - Output directory validation

use std::collections::hash_map::DefaultHasher;
use std::error::Error;
use std::fs as stdfs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Collapse every run of whitespace to a single space and trim the ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  Stocks \n\t rally "), "Stocks rally");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased, whitespace-collapsed title used for duplicate detection.
pub fn normalize_title(title: &str) -> String {
    collapse_whitespace(&title.to_lowercase())
}

/// Per-run article identifier: a 64-bit `DefaultHasher` digest of the URL.
///
/// Not collision checked and not stable across Rust releases, so it must
/// never be persisted as a key.
pub fn url_id(url: &str) -> String {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then creates and immediately
/// deletes a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let s = "é".repeat(10);
        let result = truncate_for_log(&s, 3);
        assert!(result.starts_with('é'));
        assert!(result.contains("(+18 bytes)"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Stocks \n\t rally  "), "Stocks rally");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace("one"), "one");
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Fed  Holds Rates\nSteady"), "fed holds rates steady");
        assert_eq!(normalize_title("FED HOLDS RATES STEADY"), normalize_title("fed holds rates steady"));
    }

    #[test]
    fn test_url_id_is_stable_within_a_run() {
        let a = url_id("https://www.cnbc.com/2025/11/03/markets.html");
        let b = url_id("https://www.cnbc.com/2025/11/03/markets.html");
        let c = url_id("https://www.cnn.com/2025/11/03/business/markets");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("reports").join("daily");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join("..__probe_write__").exists());
    }
}
