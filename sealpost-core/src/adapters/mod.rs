//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Pickup directory (`.eml` files) for MailTransport
//! - sendmail-compatible binary for MailTransport

pub mod mime;
pub mod pickup;
pub mod sendmail;

pub use pickup::PickupDirTransport;
pub use sendmail::SendmailTransport;
