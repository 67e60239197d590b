//! Mail transport port - the external mail-sending capability

use crate::domain::result::TransportError;
use crate::domain::{OutgoingMessage, SenderIdentity};

/// Mail transport abstraction
///
/// The core only needs to enumerate sending identities and hand over one
/// message at a time. Anything platform specific (account selection quirks,
/// spooling, retries inside a mail client) belongs to the implementation.
pub trait MailTransport: Send + Sync {
    /// Transport name (e.g., "pickup", "sendmail")
    fn name(&self) -> &str;

    /// Sending identities this transport can send as
    ///
    /// Labels must be unique and stable for the lifetime of the transport.
    fn identities(&self) -> Result<Vec<SenderIdentity>, TransportError>;

    /// Send one message synchronously
    ///
    /// Fails with [`TransportError::UnknownIdentity`] when the sender is not
    /// one of [`MailTransport::identities`].
    fn send(&self, message: &OutgoingMessage<'_>) -> Result<(), TransportError>;
}
