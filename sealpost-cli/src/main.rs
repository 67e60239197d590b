//! Sealpost CLI - send a file as an encrypted archive plus a separate password mail

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{accounts, audit, config, send, sweep, Completion};

/// Sealpost - encrypted résumé delivery in two mails
#[derive(Parser)]
#[command(name = "sealpost", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file and send it, then send the password separately
    Send {
        /// File to send
        #[arg(long, short = 'f')]
        file: PathBuf,
        /// Recipient address
        #[arg(long, short = 't')]
        to: String,
        /// Sender identity label (defaults to the last one used)
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
        /// Body of the password mail; `{password}` is replaced by the password
        #[arg(long, conflicts_with = "body2_file")]
        body2: Option<String>,
        /// Read the password mail body from a file
        #[arg(long)]
        body2_file: Option<PathBuf>,
        /// Retry a failed password mail once without asking
        #[arg(long, conflicts_with = "no_retry")]
        retry: bool,
        /// Never retry a failed password mail
        #[arg(long)]
        no_retry: bool,
        /// Do not store sender and templates as the new defaults
        #[arg(long)]
        no_remember: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the sender identities offered by the mail transport
    Accounts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show recent delivery attempts
    Audit {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Show only failed attempts
        #[arg(long)]
        failed: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete staged archives older than the retention period
    Sweep {
        /// Retention period in days (defaults to the configured value)
        #[arg(long)]
        days: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SEALPOST_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(Completion::Done) => ExitCode::SUCCESS,
        Ok(Completion::PasswordPending) => ExitCode::from(2),
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<Completion> {
    commands::sweep_on_start();

    match cli.command {
        Commands::Send {
            file,
            to,
            from,
            subject1,
            body1,
            body1_file,
            subject2,
            body2,
            body2_file,
            retry,
            no_retry,
            no_remember,
            json,
        } => send::run(send::SendArgs {
            file,
            to,
            from,
            subject1,
            body1,
            body1_file,
            subject2,
            body2,
            body2_file,
            retry: match (retry, no_retry) {
                (true, _) => send::RetryPolicy::Always,
                (_, true) => send::RetryPolicy::Never,
                _ => send::RetryPolicy::Ask,
            },
            remember: !no_remember,
            json,
        }),
        Commands::Accounts { json } => accounts::run(json).map(|_| Completion::Done),
        Commands::Audit {
            limit,
            failed,
            json,
        } => audit::run(limit, failed, json).map(|_| Completion::Done),
        Commands::Sweep { days, json } => sweep::run(days, json).map(|_| Completion::Done),
        Commands::Config { command } => config::run(command).map(|_| Completion::Done),
    }
}
