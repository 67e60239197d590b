//! Config command - inspect and change settings

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Subcommand;

use super::{get_app_dir, get_context, read_body};
use crate::output;
use sealpost_core::config::DefaultsUpdate;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save default sender and templates without sending anything
    Set {
        /// Default sender identity label (empty string clears it)
        #[arg(long)]
        from: Option<String>,
        /// Subject of the archive mail
        #[arg(long)]
        subject1: Option<String>,
        /// Body of the archive mail
        #[arg(long, conflicts_with = "body1_file")]
        body1: Option<String>,
        /// Read the archive mail body from a file
        #[arg(long)]
        body1_file: Option<PathBuf>,
        /// Subject of the password mail
        #[arg(long)]
        subject2: Option<String>,
        /// Body of the password mail; must contain `{password}`
        #[arg(long, conflicts_with = "body2_file")]
        body2: Option<String>,
        /// Read the password mail body from a file
        #[arg(long)]
        body2_file: Option<PathBuf>,
        /// Days to keep staged archives
        #[arg(long)]
        retention_days: Option<u64>,
    },
    /// Print the settings file location
    Path,
}

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { json } => {
            let ctx = get_context()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&ctx.config)?);
                return Ok(());
            }

            let config = &ctx.config;
            println!("Settings:       {}", ctx.paths.settings().display());
            println!("Transport:      {}", ctx.transport.name());
            println!(
                "Default sender: {}",
                config.default_sender.as_deref().unwrap_or("(first identity)")
            );
            println!("Retention:      {} day(s)", config.retention_days);
            println!("Identities:     {}", config.identities.len());
            println!("Subject 1:      {}", config.templates.subject1);
            println!("Subject 2:      {}", config.templates.subject2);
        }
        ConfigCommands::Set {
            from,
            subject1,
            body1,
            body1_file,
            subject2,
            body2,
            body2_file,
            retention_days,
        } => {
            let update = DefaultsUpdate {
                default_sender: from,
                subject1,
                body1: read_body(body1, body1_file)?,
                subject2,
                body2: read_body(body2, body2_file)?,
                retention_days,
            };
            if update.is_empty() {
                bail!("Nothing to set; pass at least one option (see `sealpost config set --help`)");
            }

            let mut ctx = get_context()?;
            ctx.config.apply(update);
            if !ctx.config.templates.has_password_placeholder() {
                output::warning(
                    "Password mail body has no {password} placeholder; the password will not be sent.",
                );
            }
            ctx.config.save(ctx.paths.root())?;
            output::success(&format!("Saved {}", ctx.paths.settings().display()));
        }
        ConfigCommands::Path => {
            println!("{}", get_app_dir()?.join("settings.json").display());
        }
    }
    Ok(())
}
