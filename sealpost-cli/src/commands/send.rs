//! Send command - one delivery transaction

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use super::{get_app_dir, get_context, read_body, Completion};
use crate::output;
use sealpost_core::services::{DeliveryRequest, TransactionOutcome};
use sealpost_core::{
    DeliveryStage, MessageTemplates, OperatorPrompt, SourceFile, TransportError,
};

/// What to do when the password mail fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Ask on an interactive terminal, decline otherwise
    Ask,
    Always,
    Never,
}

pub struct SendArgs {
    pub file: PathBuf,
    pub to: String,
    pub from: Option<String>,
    pub subject1: Option<String>,
    pub body1: Option<String>,
    pub body1_file: Option<PathBuf>,
    pub subject2: Option<String>,
    pub body2: Option<String>,
    pub body2_file: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub remember: bool,
    pub json: bool,
}

/// Terminal side of the workflow: spinner plus the retry question
struct TerminalOperator {
    policy: RetryPolicy,
    interactive: bool,
    spinner: Option<ProgressBar>,
}

impl TerminalOperator {
    fn new(policy: RetryPolicy, json: bool) -> Self {
        let interactive = !json && atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stderr);
        let spinner = (!json && atty::is(atty::Stream::Stderr)).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });
        Self {
            policy,
            interactive,
            spinner,
        }
    }

    fn finish(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }

    fn ask(&self, error: &TransportError) -> bool {
        let prompt = format!("Password mail failed ({}). Retry once?", error);
        let answer = || {
            Confirm::new()
                .with_prompt(prompt.as_str())
                .default(true)
                .interact()
                .unwrap_or(false)
        };
        match &self.spinner {
            Some(pb) => pb.suspend(answer),
            None => answer(),
        }
    }
}

impl OperatorPrompt for TerminalOperator {
    fn confirm_password_retry(&self, error: &TransportError) -> bool {
        match self.policy {
            RetryPolicy::Always => true,
            RetryPolicy::Never => false,
            RetryPolicy::Ask if self.interactive => self.ask(error),
            RetryPolicy::Ask => false,
        }
    }

    fn stage(&self, stage: DeliveryStage) {
        if let Some(pb) = &self.spinner {
            pb.set_message(stage.describe());
        }
    }
}

pub fn run(args: SendArgs) -> Result<Completion> {
    let mut ctx = get_context()?;
    let orchestrator = ctx.orchestrator()?;

    if orchestrator.identities().is_empty() {
        bail!(
            "No sender identities available from the {} transport; add some to {:?}",
            ctx.transport.name(),
            ctx.paths.settings()
        );
    }

    let defaults = &ctx.config.templates;
    let templates = MessageTemplates {
        subject1: args.subject1.unwrap_or_else(|| defaults.subject1.clone()),
        body1: read_body(args.body1, args.body1_file)?.unwrap_or_else(|| defaults.body1.clone()),
        subject2: args.subject2.unwrap_or_else(|| defaults.subject2.clone()),
        body2: read_body(args.body2, args.body2_file)?.unwrap_or_else(|| defaults.body2.clone()),
    };
    if !templates.has_password_placeholder() && !args.json {
        output::warning("Password mail body has no {password} placeholder; the password will not be sent.");
    }

    let sender = match args.from {
        Some(label) => label,
        None => orchestrator
            .identities()
            .default_label(ctx.config.default_sender.as_deref())
            .map(str::to_string)
            .context("No sender identity available")?,
    };

    let request = DeliveryRequest {
        sender,
        recipient: args.to,
        source: SourceFile::new(args.file),
        templates,
    };

    let operator = TerminalOperator::new(args.retry, args.json);
    let result = orchestrator.send(&request, &operator);
    operator.finish();
    let outcome = result?;

    if outcome.is_delivered() && args.remember {
        ctx.config
            .remember_last_send(request.sender.trim(), &request.templates);
        if let Err(e) = ctx.config.save(&get_app_dir()?) {
            tracing::warn!(error = %e, "failed to remember sender and templates");
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome, &request);
    }

    Ok(match outcome {
        TransactionOutcome::Delivered { .. } => Completion::Done,
        TransactionOutcome::PasswordPending { .. } => Completion::PasswordPending,
    })
}

fn print_outcome(outcome: &TransactionOutcome, request: &DeliveryRequest) {
    let archive = outcome.archive();
    match outcome {
        TransactionOutcome::Delivered {
            password_retried, ..
        } => {
            output::success(&format!("Delivered to {}", request.recipient.trim()));
            if *password_retried {
                println!("  {}", "Password mail went through on retry".dimmed());
            }
        }
        TransactionOutcome::PasswordPending { error, .. } => {
            output::warning(&format!(
                "Archive sent to {}, but the password mail failed: {}",
                request.recipient.trim(),
                error
            ));
            println!("  The recipient cannot open the archive until they get the password.");
        }
    }
    println!("  Archive: {}", archive.file_name());
    println!("  Size:    {}", output::format_size(archive.size_bytes));
}
