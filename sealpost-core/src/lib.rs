//! Sealpost Core - secure two-mail file delivery
//!
//! A file is sent as an AES-encrypted ZIP in one mail and the 8-digit
//! password in a second mail. The crate follows hexagonal architecture:
//!
//! - **domain**: Core entities (Credential, EncryptedArchive, AuditRecord, etc.)
//! - **ports**: Trait definitions for external collaborators (MailTransport, OperatorPrompt)
//! - **services**: Archive cipher, delivery orchestration, audit trail, retention
//! - **adapters**: Concrete mail transports (pickup directory, sendmail)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use adapters::{PickupDirTransport, SendmailTransport};
use config::{AppPaths, Config, TransportSettings};
use ports::MailTransport;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::{
    ArchiveError, DeliveryError, MessagePhase, TransportError, ValidationError,
};
pub use domain::{
    AuditRecord, AuditStatus, Credential, EncryptedArchive, MessageTemplates, SenderIdentity,
    SourceFile,
};
pub use ports::{DeliveryStage, OperatorPrompt};

/// Main context for Sealpost operations
///
/// Holds the configuration, the mail transport and the services that work
/// on the application directory.
pub struct SealpostContext {
    pub paths: AppPaths,
    pub config: Config,
    pub transport: Arc<dyn MailTransport>,
    pub cipher: ArchiveCipher,
    pub audit: AuditTrail,
    pub retention: OutboxRetention,
}

impl SealpostContext {
    /// Create a context from the settings in `app_dir`
    pub fn new(app_dir: &Path) -> Result<Self> {
        let paths = AppPaths::new(app_dir);
        let config = Config::load(app_dir)?;
        let transport = build_transport(&config, &paths);
        Ok(Self::with_transport(paths, config, transport))
    }

    /// Create a context around an already constructed transport
    pub fn with_transport(
        paths: AppPaths,
        config: Config,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        let cipher = ArchiveCipher::new(paths.outbox());
        let audit = AuditTrail::new(paths.audit_log());
        let retention = OutboxRetention::new(paths.outbox());
        Self {
            paths,
            config,
            transport,
            cipher,
            audit,
            retention,
        }
    }

    /// Snapshot the transport's identities and wire up an orchestrator
    pub fn orchestrator(&self) -> std::result::Result<DeliveryOrchestrator, TransportError> {
        let identities = IdentityDirectory::snapshot(self.transport.as_ref())?;
        Ok(DeliveryOrchestrator::new(
            Arc::clone(&self.transport),
            identities,
            self.cipher.clone(),
            self.audit.clone(),
        ))
    }

    /// Start-of-process housekeeping; failures are logged, never returned
    pub fn sweep_outbox(&self) -> SweepReport {
        self.retention
            .sweep(self.config.retention_days)
            .unwrap_or_else(|e| {
                warn!(error = %e, "outbox sweep failed");
                SweepReport::default()
            })
    }
}

/// Instantiate the transport named in the configuration
pub fn build_transport(config: &Config, paths: &AppPaths) -> Arc<dyn MailTransport> {
    let identities = config.identities.clone();
    match &config.transport {
        TransportSettings::Pickup { dir } => Arc::new(PickupDirTransport::new(
            dir.clone().unwrap_or_else(|| paths.pickup()),
            identities,
        )),
        TransportSettings::Sendmail { program, args } => Arc::new(SendmailTransport::new(
            program
                .clone()
                .unwrap_or_else(|| adapters::sendmail::DEFAULT_SENDMAIL.into()),
            args.clone(),
            identities,
        )),
    }
}
