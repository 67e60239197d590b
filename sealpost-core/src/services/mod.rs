//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on one part of the delivery workflow.

pub mod archive;
mod audit;
pub mod delivery;
mod identity;
pub mod retention;

pub use archive::ArchiveCipher;
pub use audit::AuditTrail;
pub use delivery::{is_valid_recipient, DeliveryOrchestrator, DeliveryRequest, TransactionOutcome};
pub use identity::IdentityDirectory;
pub use retention::{OutboxRetention, SweepReport, DEFAULT_RETENTION_DAYS};
