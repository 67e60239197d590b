//! Operator port - decisions and progress the workflow hands back to a human

use crate::domain::result::TransportError;

/// Step of a delivery, reported for progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStage {
    BuildingArchive,
    VerifyingArchive,
    SendingArchive,
    SendingPassword,
    RetryingPassword,
}

impl DeliveryStage {
    pub fn describe(&self) -> &'static str {
        match self {
            DeliveryStage::BuildingArchive => "Building encrypted archive",
            DeliveryStage::VerifyingArchive => "Verifying archive",
            DeliveryStage::SendingArchive => "Sending archive mail",
            DeliveryStage::SendingPassword => "Sending password mail",
            DeliveryStage::RetryingPassword => "Retrying password mail",
        }
    }
}

/// Operator interaction used by the delivery orchestrator
pub trait OperatorPrompt {
    /// Asked once when the password mail fails; `true` retries it exactly once
    fn confirm_password_retry(&self, error: &TransportError) -> bool;

    /// Progress notification
    fn stage(&self, _stage: DeliveryStage) {}
}

impl<F> OperatorPrompt for F
where
    F: Fn(&TransportError) -> bool,
{
    fn confirm_password_retry(&self, error: &TransportError) -> bool {
        self(error)
    }
}
