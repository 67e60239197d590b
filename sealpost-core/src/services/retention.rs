//! Retention service - time-based eviction of staged archives
//!
//! Best-effort housekeeping: per-file failures are counted and logged but
//! never abort the sweep.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::archive::ARCHIVE_EXTENSION;

/// Default retention window for staged archives
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Result of one sweep
#[derive(Debug, Default, Serialize)]
pub struct SweepReport {
    /// Archives inspected
    pub scanned: usize,
    /// Archives deleted
    pub removed: Vec<PathBuf>,
    /// Archives that were due but could not be inspected or deleted
    pub failed: usize,
}

/// Evicts archives older than a retention window from the staging directory
#[derive(Debug, Clone)]
pub struct OutboxRetention {
    staging_dir: PathBuf,
}

impl OutboxRetention {
    pub fn new(staging_dir: PathBuf) -> Self {
        Self { staging_dir }
    }

    /// Delete archives whose age is strictly greater than `max_age_days`
    pub fn sweep(&self, max_age_days: u64) -> Result<SweepReport> {
        self.sweep_at(max_age_days, SystemTime::now())
    }

    /// Same as [`OutboxRetention::sweep`] measured against `now`
    pub fn sweep_at(&self, max_age_days: u64, now: SystemTime) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        if !self.staging_dir.exists() {
            return Ok(report);
        }

        let max_age = Duration::from_secs(max_age_days.saturating_mul(SECONDS_PER_DAY));
        let entries = fs::read_dir(&self.staging_dir)
            .with_context(|| format!("Failed to read staging directory {:?}", self.staging_dir))?;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable staging entry");
                    report.failed += 1;
                    continue;
                }
            };
            if !is_archive(&path) {
                continue;
            }
            report.scanned += 1;

            match evict_if_expired(&path, max_age, now) {
                Ok(true) => report.removed.push(path),
                Ok(false) => {}
                Err(e) => {
                    warn!(archive = %path.display(), error = %e, "could not evict archive");
                    report.failed += 1;
                }
            }
        }

        if !report.removed.is_empty() {
            info!(
                removed = report.removed.len(),
                dir = %self.staging_dir.display(),
                "evicted expired archives"
            );
        }
        Ok(report)
    }
}

fn is_archive(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

fn evict_if_expired(path: &Path, max_age: Duration, now: SystemTime) -> std::io::Result<bool> {
    let modified = fs::metadata(path)?.modified()?;
    // mtime in the future yields Err here: treat as fresh
    let Ok(age) = now.duration_since(modified) else {
        return Ok(false);
    };
    if age <= max_age {
        return Ok(false);
    }
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, mtime: SystemTime) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(mtime).unwrap();
        path
    }

    #[test]
    fn test_only_archives_past_the_window_are_removed() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let day = Duration::from_secs(SECONDS_PER_DAY);

        let fresh = touch(dir.path(), "a_0d.zip", now);
        let six = touch(dir.path(), "b_6d.zip", now - day * 6);
        let seven = touch(dir.path(), "c_7d.zip", now - day * 7);
        let eight = touch(dir.path(), "d_8d.zip", now - day * 8);

        let retention = OutboxRetention::new(dir.path().to_path_buf());
        let report = retention.sweep_at(7, now).unwrap();

        assert_eq!(report.scanned, 4);
        assert_eq!(report.removed, vec![eight.clone()]);
        assert_eq!(report.failed, 0);
        assert!(fresh.exists());
        assert!(six.exists());
        assert!(seven.exists(), "exactly 7 days old must be retained");
        assert!(!eight.exists());
    }

    #[test]
    fn test_boundary_plus_one_second_is_removed() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let path = touch(
            dir.path(),
            "edge.zip",
            now - Duration::from_secs(7 * SECONDS_PER_DAY + 1),
        );

        let report = OutboxRetention::new(dir.path().to_path_buf())
            .sweep_at(7, now)
            .unwrap();
        assert_eq!(report.removed, vec![path.clone()]);
        assert!(!path.exists());
    }

    #[test]
    fn test_non_archives_and_subdirectories_are_ignored() {
        let dir = tempdir().unwrap();
        let old = SystemTime::now() - Duration::from_secs(30 * SECONDS_PER_DAY);
        let note = touch(dir.path(), "notes.txt", old);
        fs::create_dir(dir.path().join("nested.zip")).unwrap();
        let upper = touch(dir.path(), "OLD.ZIP", old);

        let report = OutboxRetention::new(dir.path().to_path_buf())
            .sweep(7)
            .unwrap();
        assert_eq!(report.scanned, 1);
        assert!(note.exists());
        assert!(dir.path().join("nested.zip").is_dir());
        assert!(!upper.exists());
    }

    #[test]
    fn test_future_mtime_is_kept() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        let path = touch(dir.path(), "future.zip", now + Duration::from_secs(3600));

        let report = OutboxRetention::new(dir.path().to_path_buf())
            .sweep_at(0, now)
            .unwrap();
        assert!(report.removed.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_missing_directory_is_empty_sweep() {
        let dir = tempdir().unwrap();
        let report = OutboxRetention::new(dir.path().join("absent"))
            .sweep(7)
            .unwrap();
        assert_eq!(report.scanned, 0);
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let dir = tempdir().unwrap();
        let now = SystemTime::now();
        touch(dir.path(), "old.zip", now - Duration::from_secs(9 * SECONDS_PER_DAY));
        let retention = OutboxRetention::new(dir.path().to_path_buf());

        assert_eq!(retention.sweep_at(7, now).unwrap().removed.len(), 1);
        let second = retention.sweep_at(7, now).unwrap();
        assert_eq!(second.scanned, 0);
        assert!(second.removed.is_empty());
    }
}
