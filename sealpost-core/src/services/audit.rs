//! Audit service - append-only JSON-lines log of delivery attempts
//!
//! One self-contained JSON object per line. Records are never rewritten or
//! removed here.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::warn;

use crate::domain::AuditRecord;

/// Durable audit log
#[derive(Debug, Clone)]
pub struct AuditTrail {
    path: PathBuf,
}

impl AuditTrail {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the log and its parent directories if needed
    pub fn append(&self, record: &AuditRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create audit directory {:?}", parent))?;
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open audit log {:?}", self.path))?;

        // Other processes may append concurrently; keep lines whole
        FileExt::lock_exclusive(&file)
            .with_context(|| format!("Failed to lock audit log {:?}", self.path))?;
        let written = file
            .write_all(line.as_bytes())
            .and_then(|_| file.sync_data());
        let _ = FileExt::unlock(&file);

        written.with_context(|| format!("Failed to write audit log {:?}", self.path))
    }

    /// Append, logging instead of returning failures
    ///
    /// Audit writes never gate delivery: a mail that already went out stays sent.
    pub fn record(&self, record: &AuditRecord) {
        if let Err(e) = self.append(record) {
            warn!(
                status = record.status.as_str(),
                error = %e,
                "failed to write audit record"
            );
        }
    }

    /// Most recent records first, at most `limit`
    ///
    /// Lines that do not parse are skipped.
    pub fn read_recent(&self, limit: usize) -> Result<Vec<AuditRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open audit log {:?}", self.path))?;
        let mut records = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read audit log {:?}", self.path))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditRecord>(&line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = index + 1, error = %e, "skipping malformed audit line"),
            }
        }

        records.reverse();
        records.truncate(limit);
        Ok(records)
    }
}
