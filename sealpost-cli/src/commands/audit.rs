//! Audit command - recent delivery attempts

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;
use sealpost_core::AuditStatus;

/// How far back `--failed` looks before filtering
const FAILED_SCAN_LIMIT: usize = 10_000;

pub fn run(limit: usize, failed: bool, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let records: Vec<_> = if failed {
        ctx.audit
            .read_recent(FAILED_SCAN_LIMIT)?
            .into_iter()
            .filter(|record| record.status.is_failure())
            .take(limit)
            .collect()
    } else {
        ctx.audit.read_recent(limit)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No delivery attempts recorded.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Sender", "Recipient", "Status", "Error"]);
    for record in &records {
        let status = match record.status {
            AuditStatus::Success => record.status.as_str().green(),
            AuditStatus::Mail2Failed => record.status.as_str().yellow(),
            AuditStatus::Failed => record.status.as_str().red(),
        };
        table.add_row(vec![
            record.timestamp.clone(),
            record.sender.clone(),
            record.recipient.clone(),
            status.to_string(),
            record.error.clone(),
        ]);
    }
    println!("{}", table);
    println!(
        "{}",
        format!("Log: {}", ctx.audit.path().display()).dimmed()
    );
    Ok(())
}
