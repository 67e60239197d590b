//! CLI command implementations

pub mod accounts;
pub mod audit;
pub mod config;
pub mod send;
pub mod sweep;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use sealpost_core::SealpostContext;

/// How a command finished, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    /// Archive mail sent, password mail still outstanding
    PasswordPending,
}

/// Get the application directory from environment or default
pub fn get_app_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SEALPOST_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".sealpost"))
        .context("Could not find home directory; set SEALPOST_DIR")
}

/// Get or create the sealpost context
pub fn get_context() -> Result<SealpostContext> {
    let app_dir = get_app_dir()?;

    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("Failed to create sealpost directory: {:?}", app_dir))?;

    SealpostContext::new(&app_dir).context("Failed to initialize sealpost context")
}

/// Retention sweep run before every command
///
/// Never blocks the command itself.
pub fn sweep_on_start() {
    match get_context() {
        Ok(ctx) => {
            let report = ctx.sweep_outbox();
            debug!(
                scanned = report.scanned,
                removed = report.removed.len(),
                "startup sweep"
            );
        }
        Err(e) => warn!(error = %e, "skipping startup sweep"),
    }
}

/// Inline text wins over a file; neither means "keep the default"
pub fn read_body(inline: Option<String>, file: Option<PathBuf>) -> Result<Option<String>> {
    match (inline, file) {
        (Some(body), _) => Ok(Some(body)),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map(Some)
            .with_context(|| format!("Failed to read body file {:?}", path)),
        (None, None) => Ok(None),
    }
}
