//! Result and error types for the core library
//!
//! One error type per failure kind of the delivery workflow.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bad input detected before any side effect took place
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Source file not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Invalid recipient address: {0:?}")]
    InvalidRecipient(String),

    #[error("Unknown sender identity: {0:?}")]
    UnknownSender(String),
}

/// Archive construction or verification failure
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Password must be exactly 8 digits")]
    InvalidCredential,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("ZIP content mismatch: expected {expected:?}, found {found:?}")]
    ContentMismatch { expected: String, found: Vec<String> },

    #[error("ZIP integrity check failed: {0}")]
    IntegrityFailure(String),
}

impl ArchiveError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Mail transport failure reported by a [`crate::ports::MailTransport`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Sender account not found: {0}")]
    UnknownIdentity(String),

    #[error("Mail transport unavailable: {0}")]
    Unavailable(String),

    #[error("Send failed: {0}")]
    Send(String),
}

impl TransportError {
    pub fn send(msg: impl Into<String>) -> Self {
        Self::Send(msg.into())
    }
}

/// Which of the two messages a transport failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePhase {
    /// Message 1, carrying the encrypted archive
    Archive,
    /// Message 2, carrying the password
    Password,
}

impl std::fmt::Display for MessagePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessagePhase::Archive => write!(f, "archive mail"),
            MessagePhase::Password => write!(f, "password mail"),
        }
    }
}

/// Error returned by [`crate::services::DeliveryOrchestrator::send`]
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("{phase} failed: {source}")]
    Transport {
        phase: MessagePhase,
        #[source]
        source: TransportError,
    },
}

impl DeliveryError {
    /// Whether a transaction was entered before the failure
    ///
    /// Validation failures happen before any side effect and are never audited.
    pub fn entered_transaction(&self) -> bool {
        !matches!(self, DeliveryError::Validation(_))
    }
}
