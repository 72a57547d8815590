//! Deletion of old generated reports.
//!
//! Only files named `{prefix}_{yyyymmdd}-{hhmm}.md` are considered, and their
//! age comes from the timestamp in the name rather than filesystem metadata.

use chrono::{DateTime, Duration, Local, NaiveDateTime};
use regex::Regex;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Timestamp embedded in a generated report name, if `name` is one.
pub fn report_timestamp(name: &str, prefix: &str) -> Option<NaiveDateTime> {
    let pattern = format!(r"^{}_(\d{{8}}-\d{{4}})\.md$", regex::escape(prefix));
    let re = Regex::new(&pattern).ok()?;
    let stamp = re.captures(name)?.get(1)?.as_str();
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d-%H%M").ok()
}

/// Delete reports in `dir` older than `retention_days` relative to `now`.
/// Individual failures are logged and skipped. Returns how many files were
/// removed.
#[instrument(level = "info", skip(dir, now), fields(dir = %dir.display()))]
pub async fn prune_stale_reports(dir: &Path, prefix: &str, retention_days: i64, now: DateTime<Local>) -> usize {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Could not list report directory");
            return 0;
        }
    };

    let Some(cutoff) = Duration::try_days(retention_days).and_then(|age| now.naive_local().checked_sub_signed(age))
    else {
        debug!(retention_days, "Retention period reaches past the calendar; nothing is stale");
        return 0;
    };
    let mut removed = 0;

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read directory entry");
                break;
            }
        };
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some(stamp) = report_timestamp(name, prefix) else {
            continue;
        };
        if stamp >= cutoff {
            continue;
        }

        match fs::remove_file(entry.path()).await {
            Ok(()) => {
                debug!(file = name, %stamp, "Removed stale report");
                removed += 1;
            }
            Err(e) => warn!(file = name, error = %e, "Failed to remove stale report"),
        }
    }

    if removed > 0 {
        info!(removed, retention_days, "Pruned old reports");
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_timestamp() {
        assert_eq!(
            report_timestamp("US_News_20251103-1230.md", "US_News"),
            NaiveDateTime::parse_from_str("20251103-1230", "%Y%m%d-%H%M").ok()
        );
        assert_eq!(report_timestamp("US_News_20251103-1230.md.bak", "US_News"), None);
        assert_eq!(report_timestamp("Other_20251103-1230.md", "US_News"), None);
        assert_eq!(report_timestamp("US_News_2025-11-03.md", "US_News"), None);
        assert_eq!(report_timestamp("US_News_20251399-1230.md", "US_News"), None);
    }

    #[tokio::test]
    async fn test_prune_removes_only_old_matching_reports() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        for name in [
            "US_News_20250901-0800.md",
            "US_News_20251101-0800.md",
            "Other_20250901-0800.md",
            "notes.md",
        ] {
            std::fs::write(dir.join(name), "x").unwrap();
        }

        let now = Local.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
        let removed = prune_stale_reports(dir, "US_News", 30, now).await;

        assert_eq!(removed, 1);
        assert!(!dir.join("US_News_20250901-0800.md").exists());
        assert!(dir.join("US_News_20251101-0800.md").exists());
        assert!(dir.join("Other_20250901-0800.md").exists());
        assert!(dir.join("notes.md").exists());
    }

    #[tokio::test]
    async fn test_prune_skips_entries_it_cannot_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::create_dir(dir.join("US_News_20250801-0800.md")).unwrap();
        std::fs::write(dir.join("US_News_20250901-0800.md"), "x").unwrap();

        let now = Local.with_ymd_and_hms(2025, 11, 3, 12, 0, 0).unwrap();
        let removed = prune_stale_reports(dir, "US_News", 30, now).await;

        assert_eq!(removed, 1);
        assert!(dir.join("US_News_20250801-0800.md").is_dir());
        assert!(!dir.join("US_News_20250901-0800.md").exists());
    }

    #[tokio::test]
    async fn test_prune_with_unbounded_retention_keeps_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        std::fs::write(dir.join("US_News_19990101-0000.md"), "x").unwrap();

        let removed = prune_stale_reports(dir, "US_News", 10_000_000_000, Local::now()).await;

        assert_eq!(removed, 0);
        assert!(dir.join("US_News_19990101-0000.md").exists());
    }

    #[tokio::test]
    async fn test_prune_missing_dir_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let now = Local::now();
        assert_eq!(prune_stale_reports(&tmp.path().join("absent"), "US_News", 30, now).await, 0);
    }
}
