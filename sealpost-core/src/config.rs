//! Configuration management
//!
//! Settings live in `settings.json` inside the application directory:
//! ```json
//! {
//!   "defaultSender": "me@example.com",
//!   "subject1": "...", "body1": "...", "subject2": "...", "body2": "... {password} ...",
//!   "retentionDays": 7,
//!   "identities": [ { "label": "me@example.com", "address": "me@example.com" } ],
//!   "transport": { "kind": "pickup", "dir": "/var/spool/pickup" }
//! }
//! ```
//! Every key is optional. Keys this crate does not know are kept on save.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{MessageTemplates, SenderIdentity};
use crate::services::DEFAULT_RETENTION_DAYS;

const SETTINGS_FILE: &str = "settings.json";

/// Filesystem layout of the application directory
#[derive(Debug, Clone)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    pub fn audit_log(&self) -> PathBuf {
        self.root.join("logs").join("audit.jsonl")
    }

    /// Staging directory for encrypted archives
    pub fn outbox(&self) -> PathBuf {
        self.root.join("outbox")
    }

    /// Default target of the pickup transport
    pub fn pickup(&self) -> PathBuf {
        self.root.join("pickup")
    }
}

/// Which mail transport to use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportSettings {
    /// Write `.eml` files into a pickup directory
    Pickup {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dir: Option<PathBuf>,
    },
    /// Pipe messages into a sendmail-compatible program
    Sendmail {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        program: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
    },
}

impl Default for TransportSettings {
    fn default() -> Self {
        TransportSettings::Pickup { dir: None }
    }
}

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_sender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retention_days: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    identities: Vec<SenderIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transport: Option<TransportSettings>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Partial change to the stored defaults; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct DefaultsUpdate {
    pub default_sender: Option<String>,
    pub subject1: Option<String>,
    pub body1: Option<String>,
    pub subject2: Option<String>,
    pub body2: Option<String>,
    pub retention_days: Option<u64>,
}

impl DefaultsUpdate {
    pub fn is_empty(&self) -> bool {
        self.default_sender.is_none()
            && self.subject1.is_none()
            && self.body1.is_none()
            && self.subject2.is_none()
            && self.body2.is_none()
            && self.retention_days.is_none()
    }
}

/// Sealpost configuration (resolved view of settings.json)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub default_sender: Option<String>,
    pub templates: MessageTemplates,
    pub retention_days: u64,
    pub identities: Vec<SenderIdentity>,
    pub transport: TransportSettings,
    // Keep the raw settings for preservation when saving
    #[serde(skip)]
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_raw(SettingsFile::default())
    }
}

impl Config {
    /// Load config from the application directory
    ///
    /// A missing or unreadable settings.json yields defaults. The default
    /// sender can be overridden with `SEALPOST_SENDER`.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let settings_path = app_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {:?}", settings_path))?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %settings_path.display(), error = %e, "ignoring malformed settings");
                SettingsFile::default()
            })
        } else {
            SettingsFile::default()
        };

        let mut config = Self::from_raw(raw);
        if let Ok(sender) = std::env::var("SEALPOST_SENDER") {
            if !sender.trim().is_empty() {
                config.default_sender = Some(sender.trim().to_string());
            }
        }
        Ok(config)
    }

    fn from_raw(raw: SettingsFile) -> Self {
        let defaults = MessageTemplates::default();
        let templates = MessageTemplates {
            subject1: raw.subject1.clone().unwrap_or(defaults.subject1),
            body1: raw.body1.clone().unwrap_or(defaults.body1),
            subject2: raw.subject2.clone().unwrap_or(defaults.subject2),
            body2: raw.body2.clone().unwrap_or(defaults.body2),
        };

        Self {
            default_sender: raw
                .default_sender
                .clone()
                .filter(|sender| !sender.trim().is_empty()),
            templates,
            retention_days: raw.retention_days.unwrap_or(DEFAULT_RETENTION_DAYS),
            identities: raw.identities.clone(),
            transport: raw.transport.clone().unwrap_or_default(),
            _raw_settings: raw,
        }
    }

    /// Save config to the application directory
    /// Preserves other settings that this crate doesn't manage
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(app_dir)
            .with_context(|| format!("Failed to create {:?}", app_dir))?;
        let settings_path = app_dir.join(SETTINGS_FILE);

        // Reload so edits made since load() are not clobbered
        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content)
                .unwrap_or_else(|_| self._raw_settings.clone())
        } else {
            self._raw_settings.clone()
        };

        settings.default_sender = self.default_sender.clone();
        settings.subject1 = Some(self.templates.subject1.clone());
        settings.body1 = Some(self.templates.body1.clone());
        settings.subject2 = Some(self.templates.subject2.clone());
        settings.body2 = Some(self.templates.body2.clone());
        settings.retention_days = Some(self.retention_days);
        settings.identities = self.identities.clone();
        settings.transport = Some(self.transport.clone());

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {:?}", settings_path))?;
        Ok(())
    }

    /// Overwrite the defaults named in `update`
    ///
    /// A blank sender clears the stored default.
    pub fn apply(&mut self, update: DefaultsUpdate) {
        if let Some(sender) = update.default_sender {
            let sender = sender.trim();
            self.default_sender = (!sender.is_empty()).then(|| sender.to_string());
        }
        if let Some(subject1) = update.subject1 {
            self.templates.subject1 = subject1;
        }
        if let Some(body1) = update.body1 {
            self.templates.body1 = body1;
        }
        if let Some(subject2) = update.subject2 {
            self.templates.subject2 = subject2;
        }
        if let Some(body2) = update.body2 {
            self.templates.body2 = body2;
        }
        if let Some(days) = update.retention_days {
            self.retention_days = days;
        }
    }

    /// Make the sender and templates of a successful delivery the new defaults
    pub fn remember_last_send(&mut self, sender: &str, templates: &MessageTemplates) {
        self.default_sender = Some(sender.to_string());
        self.templates = templates.clone();
    }
}
