//! Sweep command - retention pass over the staging directory

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(days: Option<u64>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let days = days.unwrap_or(ctx.config.retention_days);
    let report = ctx.retention.sweep(days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.removed.is_empty() {
        println!(
            "No archives older than {} day(s) ({} staged).",
            days, report.scanned
        );
    } else {
        output::success(&format!("Removed {} archive(s)", report.removed.len()));
        for path in &report.removed {
            println!("  {}", path.display());
        }
    }
    if report.failed > 0 {
        output::warning(&format!("{} archive(s) could not be removed", report.failed));
    }
    Ok(())
}
