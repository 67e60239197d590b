//! Sendmail transport - pipes rendered messages into a sendmail-compatible binary

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use chrono::Local;
use tracing::debug;
use uuid::Uuid;

use super::mime::render_message;
use crate::domain::result::TransportError;
use crate::domain::{OutgoingMessage, SenderIdentity};
use crate::ports::MailTransport;
use crate::services::IdentityDirectory;

/// Default sendmail location on Unix systems
pub const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

pub struct SendmailTransport {
    program: PathBuf,
    args: Vec<String>,
    identities: IdentityDirectory,
}

impl SendmailTransport {
    /// `args` are passed before the default `-i -t`
    pub fn new(program: PathBuf, args: Vec<String>, identities: Vec<SenderIdentity>) -> Self {
        Self {
            program,
            args,
            identities: IdentityDirectory::from_identities(identities),
        }
    }
}

impl MailTransport for SendmailTransport {
    fn name(&self) -> &str {
        "sendmail"
    }

    fn identities(&self) -> Result<Vec<SenderIdentity>, TransportError> {
        Ok(self.identities.identities().to_vec())
    }

    fn send(&self, message: &OutgoingMessage<'_>) -> Result<(), TransportError> {
        let identity = self
            .identities
            .get(&message.sender.label)
            .ok_or_else(|| TransportError::UnknownIdentity(message.sender.label.clone()))?;
        let rendered = render_message(message, Local::now(), Uuid::new_v4())?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg("-f")
            .arg(identity.address.trim())
            .args(["-i", "-t"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TransportError::Unavailable(format!("Cannot start {:?}: {}", self.program, e))
            })?;

        // Child may fill stderr before it has read all of stdin
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                let result = stdin.write_all(&rendered);
                drop(stdin);
                result
            })
        });

        let output = child
            .wait_with_output()
            .map_err(|e| TransportError::send(format!("sendmail did not finish: {}", e)))?;
        let written = match writer.map(|handle| handle.join()) {
            Some(Ok(result)) => result,
            Some(Err(_)) => Err(io::Error::other("stdin writer panicked")),
            None => Ok(()),
        };

        // A failed exit status wins over the broken pipe it caused
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::send(format!(
                "sendmail exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        written.map_err(|e| TransportError::send(format!("Cannot write to sendmail: {}", e)))?;

        debug!(program = %self.program.display(), "message handed to sendmail");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    /// Run a shell script through `/bin/sh` so the test never execs a freshly written file
    fn fake_sendmail(
        dir: &std::path::Path,
        script: &str,
        identity: SenderIdentity,
    ) -> SendmailTransport {
        let path = dir.join("sendmail.sh");
        fs::write(&path, format!("{}\n", script)).unwrap();
        SendmailTransport::new(
            PathBuf::from("/bin/sh"),
            vec![path.display().to_string()],
            vec![identity],
        )
    }

    fn message_for(identity: &SenderIdentity) -> OutgoingMessage<'_> {
        OutgoingMessage {
            sender: identity,
            recipient: "a@b.com",
            subject: "Hello",
            body: "Body",
            attachment: None,
        }
    }

    #[test]
    fn test_message_is_piped_to_program() {
        let dir = tempdir().unwrap();
        let captured = dir.path().join("captured.eml");
        let transport = fake_sendmail(
            dir.path(),
            &format!("echo \"$@\" > {0}.args; cat > {0}", captured.display()),
            SenderIdentity::new("me", "me@example.com"),
        );
        let identity = transport.identities().unwrap().remove(0);

        transport.send(&message_for(&identity)).unwrap();

        let mail = fs::read_to_string(&captured).unwrap();
        assert!(mail.contains("To: a@b.com\r\n"));
        let args = fs::read_to_string(dir.path().join("captured.eml.args")).unwrap();
        assert_eq!(args.trim(), "-f me@example.com -i -t");
    }

    #[test]
    fn test_non_zero_exit_is_send_error() {
        let dir = tempdir().unwrap();
        let transport = fake_sendmail(
            dir.path(),
            "cat > /dev/null; echo 'relay denied' >&2; exit 75",
            SenderIdentity::new("me", "me@example.com"),
        );
        let identity = transport.identities().unwrap().remove(0);

        match transport.send(&message_for(&identity)) {
            Err(TransportError::Send(msg)) => assert!(msg.contains("relay denied"), "{}", msg),
            other => panic!("expected send error, got {:?}", other),
        }
    }

    #[test]
    fn test_early_exit_reports_stderr_not_broken_pipe() {
        let dir = tempdir().unwrap();
        let attachment = dir.path().join("resume_20250115_103000.zip");
        let data: Vec<u8> = (0..2 * 1024 * 1024u32).map(|i| (i % 251) as u8).collect();
        fs::write(&attachment, &data).unwrap();

        let transport = fake_sendmail(
            dir.path(),
            "echo 'relay denied: sender not allowed' >&2; exit 77",
            SenderIdentity::new("me", "me@example.com"),
        );
        let identity = transport.identities().unwrap().remove(0);
        let message = OutgoingMessage {
            attachment: Some(&attachment),
            ..message_for(&identity)
        };

        match transport.send(&message) {
            Err(TransportError::Send(msg)) => {
                assert!(msg.contains("relay denied: sender not allowed"), "{}", msg);
                assert!(msg.contains("77"), "{}", msg);
                assert!(!msg.contains("Broken pipe"), "{}", msg);
            }
            other => panic!("expected send error, got {:?}", other),
        }
    }

    #[test]
    fn test_noisy_stderr_does_not_block_large_message() {
        let dir = tempdir().unwrap();
        let attachment = dir.path().join("portfolio.zip");
        fs::write(&attachment, vec![7u8; 1024 * 1024]).unwrap();

        // Writes well past a pipe buffer to stderr before reading stdin
        let transport = fake_sendmail(
            dir.path(),
            "i=0; while [ $i -lt 2000 ]; do echo 'queue warning: slow relay, retrying' >&2; i=$((i+1)); done; cat > /dev/null",
            SenderIdentity::new("me", "me@example.com"),
        );
        let identity = transport.identities().unwrap().remove(0);
        let message = OutgoingMessage {
            attachment: Some(&attachment),
            ..message_for(&identity)
        };

        transport.send(&message).unwrap();
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let transport = SendmailTransport::new(
            PathBuf::from("/nonexistent/sendmail"),
            Vec::new(),
            vec![SenderIdentity::new("me", "me@example.com")],
        );
        let identity = transport.identities().unwrap().remove(0);
        assert!(matches!(
            transport.send(&message_for(&identity)),
            Err(TransportError::Unavailable(_))
        ));
    }
}
