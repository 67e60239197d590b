//! Core domain entities
//!
//! Plain data structures with validation logic. Archive I/O, auditing and
//! mail delivery live in the service layer.

mod archive;
mod audit;
mod credential;
mod message;
pub mod result;
mod source;

pub use archive::EncryptedArchive;
pub use audit::{AuditRecord, AuditStatus};
pub use credential::{Credential, CREDENTIAL_LEN};
pub(crate) use credential::ensure_well_formed;
pub use message::{MessageTemplates, OutgoingMessage, SenderIdentity, PASSWORD_PLACEHOLDER};
pub use source::SourceFile;
