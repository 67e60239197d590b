//! Accounts command - sender identities offered by the transport

use anyhow::Result;
use colored::Colorize;

use super::get_context;
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let orchestrator = ctx.orchestrator()?;
    let directory = orchestrator.identities();
    let default = directory.default_label(ctx.config.default_sender.as_deref());

    if json {
        let accounts: Vec<_> = directory
            .identities()
            .iter()
            .map(|identity| {
                serde_json::json!({
                    "label": identity.label,
                    "address": identity.address,
                    "displayName": identity.display_name,
                    "default": Some(identity.label.as_str()) == default,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&accounts)?);
        return Ok(());
    }

    if directory.is_empty() {
        println!("No sender identities configured for the {} transport.", ctx.transport.name());
        println!("  Add them under \"identities\" in {:?}", ctx.paths.settings());
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["", "Label", "Address", "Name"]);
    for identity in directory.identities() {
        let marker = if Some(identity.label.as_str()) == default {
            "*".green().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            marker,
            identity.label.clone(),
            identity.address.clone(),
            identity.display_name.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    println!("{}", format!("Transport: {}", ctx.transport.name()).dimmed());
    Ok(())
}
