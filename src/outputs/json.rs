//! JSON run summary.
//!
//! Written only when `--summary <path>` is given. The document is the
//! serialized [`RunStatistics`] of the run:
//!
//! ```text
//! {
//!   "total_articles": 12,
//!   "total_errors": 0,
//!   "candidates": 20,
//!   "duplicates_removed": 1,
//!   "duration_seconds": 41.7,
//!   ...
//!   "source_stats": { "CNBC": 7, "CNN": 5 }
//! }
//! ```

use crate::error::Result;
use crate::models::RunStatistics;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `stats` as pretty-printed JSON, creating the parent directory.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_summary(stats: &RunStatistics, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create summary dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!("Wrote run summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RunState, ScrapingResult};
    use crate::models::tests::article;
    use chrono::Utc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_write_summary() {
        let now = Utc::now();
        let result = ScrapingResult {
            articles: vec![article("Fed holds rates steady", "body text", "https://cnn.com/a", "CNN")],
            errors: vec![],
            started_at: now,
            finished_at: now,
            duration: Duration::from_secs(3),
            state: RunState::Success,
            candidates: 4,
            duplicates_removed: 0,
        };
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("stats").join("run.json");

        write_summary(&result.statistics(), &path).await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["total_articles"], 1);
        assert_eq!(value["candidates"], 4);
        assert_eq!(value["state"], "success");
        assert_eq!(value["source_stats"]["CNN"], 1);
    }
}
