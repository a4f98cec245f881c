//! Removal of rolled log files past their retention period.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;

/// Delete `*.log*` files in `log_dir` last modified more than `retention_days` ago.
///
/// Returns how many files were removed. A missing directory is not an error.
pub fn prune_expired_logs(log_dir: impl AsRef<Path>, retention_days: u32) -> Result<usize> {
    let log_dir = log_dir.as_ref();
    if !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
    let mut deleted = 0;

    for entry in std::fs::read_dir(log_dir).context("failed to read log directory")? {
        let path = entry.context("failed to read directory entry")?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.contains(".log"));
        if !is_log || !path.is_file() {
            continue;
        }

        let modified: DateTime<Utc> = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .context("failed to get file modification time")?
            .into();

        if modified < cutoff {
            std::fs::remove_file(&path).context("failed to delete old log file")?;
            deleted += 1;
        }
    }

    Ok(deleted)
}
