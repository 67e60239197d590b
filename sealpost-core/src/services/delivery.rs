//! Delivery service - the two-mail send protocol
//!
//! One transaction = build and verify an encrypted archive, mail the archive,
//! then mail the password separately. The password mail may be retried once
//! after the operator confirms; every other failure ends the transaction.
//!
//! Audit records written per transaction:
//! - archive or archive-mail failure: one `failed`
//! - password-mail failure: one `mail_2_failed`, then `success` if the
//!   confirmed retry goes through
//! - clean run: one `success`

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::result::{DeliveryError, MessagePhase, TransportError, ValidationError};
use crate::domain::{
    AuditRecord, AuditStatus, Credential, EncryptedArchive, MessageTemplates, OutgoingMessage,
    SenderIdentity, SourceFile,
};
use crate::ports::{DeliveryStage, MailTransport, OperatorPrompt};

use super::archive::ArchiveCipher;
use super::audit::AuditTrail;
use super::identity::IdentityDirectory;

static RECIPIENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Loose syntactic address check: `local@domain.tld`, no whitespace
pub fn is_valid_recipient(value: &str) -> bool {
    RECIPIENT_RE.is_match(value.trim())
}

/// Everything one transaction needs from the caller
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    /// Sender identity label, as listed by the identity directory
    pub sender: String,
    pub recipient: String,
    pub source: SourceFile,
    pub templates: MessageTemplates,
}

/// How a transaction ended when it did not fail outright
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransactionOutcome {
    /// Both mails sent
    Delivered {
        archive: EncryptedArchive,
        /// The password mail needed the one confirmed retry
        password_retried: bool,
    },
    /// Archive mail sent, password mail failed and the retry was declined
    PasswordPending {
        archive: EncryptedArchive,
        #[serde(serialize_with = "serialize_display")]
        error: TransportError,
    },
}

impl TransactionOutcome {
    pub fn archive(&self) -> &EncryptedArchive {
        match self {
            TransactionOutcome::Delivered { archive, .. } => archive,
            TransactionOutcome::PasswordPending { archive, .. } => archive,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, TransactionOutcome::Delivered { .. })
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &TransportError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Drives the two-phase send
pub struct DeliveryOrchestrator {
    transport: Arc<dyn MailTransport>,
    identities: IdentityDirectory,
    cipher: ArchiveCipher,
    audit: AuditTrail,
}

impl DeliveryOrchestrator {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        identities: IdentityDirectory,
        cipher: ArchiveCipher,
        audit: AuditTrail,
    ) -> Self {
        Self {
            transport,
            identities,
            cipher,
            audit,
        }
    }

    pub fn identities(&self) -> &IdentityDirectory {
        &self.identities
    }

    /// Run one transaction
    ///
    /// Precondition failures return [`DeliveryError::Validation`] before any
    /// file is written or audit record appended.
    pub fn send(
        &self,
        request: &DeliveryRequest,
        operator: &dyn OperatorPrompt,
    ) -> Result<TransactionOutcome, DeliveryError> {
        let started_at = Local::now();
        let sender = self.check_preconditions(request)?;
        let recipient = request.recipient.trim();
        let txn = Transaction {
            started_at,
            sender_label: &sender.label,
            recipient,
            audit: &self.audit,
        };

        let credential = Credential::generate();

        operator.stage(DeliveryStage::BuildingArchive);
        let archive = self
            .cipher
            .build(&request.source, &credential)
            .map_err(|e| txn.fail(e.into()))?;

        operator.stage(DeliveryStage::VerifyingArchive);
        self.cipher
            .verify(archive.path(), &credential, &archive.member)
            .map_err(|e| txn.fail(e.into()))?;
        debug!(archive = %archive.path.display(), "archive verified");

        let templates = &request.templates;
        let password_body = templates.render_password_body(credential.expose());
        drop(credential);

        operator.stage(DeliveryStage::SendingArchive);
        let archive_mail = OutgoingMessage {
            sender,
            recipient,
            subject: &templates.subject1,
            body: &templates.body1,
            attachment: Some(archive.path()),
        };
        self.transport.send(&archive_mail).map_err(|e| {
            txn.fail(DeliveryError::Transport {
                phase: MessagePhase::Archive,
                source: e,
            })
        })?;

        operator.stage(DeliveryStage::SendingPassword);
        let password_mail = OutgoingMessage {
            sender,
            recipient,
            subject: &templates.subject2,
            body: &password_body,
            attachment: None,
        };
        let mut password_retried = false;
        if let Err(first) = self.transport.send(&password_mail) {
            warn!(error = %first, "password mail failed");
            txn.record(AuditStatus::Mail2Failed, &first.to_string());

            if !operator.confirm_password_retry(&first) {
                info!(recipient, "password mail retry declined");
                return Ok(TransactionOutcome::PasswordPending {
                    archive,
                    error: first,
                });
            }

            operator.stage(DeliveryStage::RetryingPassword);
            self.transport
                .send(&password_mail)
                .map_err(|e| DeliveryError::Transport {
                    phase: MessagePhase::Password,
                    source: e,
                })?;
            password_retried = true;
        }

        txn.record(AuditStatus::Success, "");
        info!(recipient, archive = %archive.file_name(), "delivery complete");
        Ok(TransactionOutcome::Delivered {
            archive,
            password_retried,
        })
    }

    fn check_preconditions(
        &self,
        request: &DeliveryRequest,
    ) -> Result<&SenderIdentity, ValidationError> {
        if !request.source.exists() {
            return Err(ValidationError::SourceNotFound(
                request.source.path().to_path_buf(),
            ));
        }
        if !is_valid_recipient(&request.recipient) {
            return Err(ValidationError::InvalidRecipient(request.recipient.clone()));
        }
        self.identities.resolve(&request.sender)
    }
}

/// Audit context of one in-flight transaction
struct Transaction<'a> {
    started_at: DateTime<Local>,
    sender_label: &'a str,
    recipient: &'a str,
    audit: &'a AuditTrail,
}

impl Transaction<'_> {
    fn record(&self, status: AuditStatus, error: &str) {
        self.audit.record(&AuditRecord::new(
            &self.started_at,
            self.sender_label,
            self.recipient,
            status,
            error,
        ));
    }

    fn fail(&self, err: DeliveryError) -> DeliveryError {
        warn!(error = %err, "delivery failed");
        self.record(AuditStatus::Failed, &err.to_string());
        err
    }
}
