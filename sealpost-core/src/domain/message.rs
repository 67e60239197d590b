//! Outgoing message and sender identity models

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Placeholder in the password mail template replaced by the credential
pub const PASSWORD_PLACEHOLDER: &str = "{password}";

/// A sending identity offered by the mail transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderIdentity {
    /// Stable, human-readable label unique within one transport
    #[serde(default)]
    pub label: String,
    /// SMTP address used in the From header
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SenderIdentity {
    pub fn new(label: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            address: address.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Subjects and bodies for the two mails of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageTemplates {
    pub subject1: String,
    pub body1: String,
    pub subject2: String,
    /// Password mail body; `{password}` is replaced with the credential
    pub body2: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            subject1: "Resume attached (encrypted archive)".to_string(),
            body1: "Hello,\n\nPlease find my resume attached as an encrypted archive. \
                    The password follows in a separate mail.\n\nThank you."
                .to_string(),
            subject2: "Password for the resume archive".to_string(),
            body2: "Hello,\n\nThe password for the resume archive is: {password}\n\nThank you."
                .to_string(),
        }
    }
}

impl MessageTemplates {
    /// Whether the password mail template will actually carry the credential
    pub fn has_password_placeholder(&self) -> bool {
        self.body2.contains(PASSWORD_PLACEHOLDER)
    }

    /// Substitute every `{password}` occurrence in the password mail body
    pub fn render_password_body(&self, password: &str) -> String {
        self.body2.replace(PASSWORD_PLACEHOLDER, password)
    }
}

/// A single mail handed to the transport
#[derive(Debug, Clone, Copy)]
pub struct OutgoingMessage<'a> {
    pub sender: &'a SenderIdentity,
    pub recipient: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub attachment: Option<&'a Path>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_every_placeholder() {
        let templates = MessageTemplates {
            body2: "pw={password} again={password}".to_string(),
            ..MessageTemplates::default()
        };
        assert_eq!(
            templates.render_password_body("12345678"),
            "pw=12345678 again=12345678"
        );
    }

    #[test]
    fn test_default_templates_carry_placeholder() {
        assert!(MessageTemplates::default().has_password_placeholder());
        let templates = MessageTemplates {
            body2: "no password here".to_string(),
            ..MessageTemplates::default()
        };
        assert!(!templates.has_password_placeholder());
    }
}
