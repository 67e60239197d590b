//! Pickup directory transport
//!
//! Drops each rendered message as an `.eml` file into a directory watched by
//! a mail agent. Files appear atomically via write-then-rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

use super::mime::render_message;
use crate::domain::result::TransportError;
use crate::domain::{OutgoingMessage, SenderIdentity};
use crate::ports::MailTransport;
use crate::services::IdentityDirectory;

pub struct PickupDirTransport {
    dir: PathBuf,
    identities: IdentityDirectory,
}

impl PickupDirTransport {
    pub fn new(dir: PathBuf, identities: Vec<SenderIdentity>) -> Self {
        Self {
            dir,
            identities: IdentityDirectory::from_identities(identities),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl MailTransport for PickupDirTransport {
    fn name(&self) -> &str {
        "pickup"
    }

    fn identities(&self) -> Result<Vec<SenderIdentity>, TransportError> {
        Ok(self.identities.identities().to_vec())
    }

    fn send(&self, message: &OutgoingMessage<'_>) -> Result<(), TransportError> {
        if self.identities.get(&message.sender.label).is_none() {
            return Err(TransportError::UnknownIdentity(message.sender.label.clone()));
        }

        let now = Local::now();
        let id = Uuid::new_v4();
        let rendered = render_message(message, now, id)?;

        fs::create_dir_all(&self.dir).map_err(|e| {
            TransportError::Unavailable(format!(
                "Cannot create pickup directory {:?}: {}",
                self.dir, e
            ))
        })?;

        let target = self
            .dir
            .join(format!("{}_{}.eml", now.format("%Y%m%dT%H%M%S"), id.simple()));
        let mut temp = NamedTempFile::new_in(&self.dir)
            .map_err(|e| TransportError::send(format!("Cannot stage message: {}", e)))?;
        temp.write_all(&rendered)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| TransportError::send(format!("Cannot write message: {}", e)))?;
        temp.persist(&target)
            .map_err(|e| TransportError::send(format!("Cannot publish message: {}", e.error)))?;

        debug!(file = %target.display(), "message dropped into pickup directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn eml_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("eml"))
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_send_writes_one_eml_per_message() {
        let dir = tempdir().unwrap();
        let pickup = dir.path().join("pickup");
        let transport = PickupDirTransport::new(
            pickup.clone(),
            vec![SenderIdentity::new("me", "me@example.com")],
        );
        let identity = transport.identities().unwrap().remove(0);

        let message = OutgoingMessage {
            sender: &identity,
            recipient: "a@b.com",
            subject: "Hello",
            body: "Body",
            attachment: None,
        };
        transport.send(&message).unwrap();
        transport.send(&message).unwrap();

        let files = eml_files(&pickup);
        assert_eq!(files.len(), 2);
        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("To: a@b.com\r\n"));
        // No leftover temp files
        assert_eq!(fs::read_dir(&pickup).unwrap().count(), 2);
    }

    #[test]
    fn test_unknown_identity_is_rejected() {
        let dir = tempdir().unwrap();
        let transport = PickupDirTransport::new(
            dir.path().to_path_buf(),
            vec![SenderIdentity::new("me", "me@example.com")],
        );
        let stranger = SenderIdentity::new("someone", "x@example.com");
        let message = OutgoingMessage {
            sender: &stranger,
            recipient: "a@b.com",
            subject: "Hello",
            body: "Body",
            attachment: None,
        };
        assert_eq!(
            transport.send(&message).unwrap_err(),
            TransportError::UnknownIdentity("someone".to_string())
        );
        assert!(eml_files(dir.path()).is_empty());
    }
}
