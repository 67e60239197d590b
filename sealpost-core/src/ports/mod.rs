//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external collaborators. The delivery
//! workflow depends only on these traits, not on concrete implementations.

mod mail_transport;
mod operator;

pub use mail_transport::MailTransport;
pub use operator::{DeliveryStage, OperatorPrompt};
