//! Identity service - per-session snapshot of sending identities

use std::collections::BTreeMap;

use crate::domain::result::{TransportError, ValidationError};
use crate::domain::SenderIdentity;
use crate::ports::MailTransport;

/// Immutable label → identity map taken from a transport once per session
#[derive(Debug, Clone, Default)]
pub struct IdentityDirectory {
    ordered: Vec<SenderIdentity>,
    by_label: BTreeMap<String, usize>,
}

impl IdentityDirectory {
    /// Enumerate the transport's identities
    pub fn snapshot(transport: &dyn MailTransport) -> Result<Self, TransportError> {
        Ok(Self::from_identities(transport.identities()?))
    }

    /// Build a directory, making labels unique
    ///
    /// Empty labels fall back to the address, then the display name, then
    /// `Account N`. Repeated labels get ` (2)`, ` (3)`... suffixes.
    pub fn from_identities(identities: Vec<SenderIdentity>) -> Self {
        let mut directory = Self::default();
        for (index, mut identity) in identities.into_iter().enumerate() {
            let base = fallback_label(&identity, index + 1);
            let mut label = base.clone();
            let mut suffix = 2;
            while directory.by_label.contains_key(&label) {
                label = format!("{} ({})", base, suffix);
                suffix += 1;
            }
            identity.label = label.clone();
            directory.by_label.insert(label, directory.ordered.len());
            directory.ordered.push(identity);
        }
        directory
    }

    /// Identities in transport order
    pub fn identities(&self) -> &[SenderIdentity] {
        &self.ordered
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(|identity| identity.label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&SenderIdentity> {
        self.by_label.get(label).map(|&index| &self.ordered[index])
    }

    /// Look up a sender label, failing as a precondition error
    pub fn resolve(&self, label: &str) -> Result<&SenderIdentity, ValidationError> {
        self.get(label.trim())
            .ok_or_else(|| ValidationError::UnknownSender(label.to_string()))
    }

    /// Preferred default: `configured` if known, else the first identity
    pub fn default_label(&self, configured: Option<&str>) -> Option<&str> {
        configured
            .and_then(|label| self.get(label))
            .or_else(|| self.ordered.first())
            .map(|identity| identity.label.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

fn fallback_label(identity: &SenderIdentity, position: usize) -> String {
    let candidates = [
        identity.label.trim(),
        identity.address.trim(),
        identity.display_name.as_deref().unwrap_or("").trim(),
    ];
    candidates
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Account {}", position))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_labels_get_suffixes() {
        let directory = IdentityDirectory::from_identities(vec![
            SenderIdentity::new("work", "a@corp.com"),
            SenderIdentity::new("work", "b@corp.com"),
            SenderIdentity::new("work", "c@corp.com"),
        ]);
        let labels: Vec<_> = directory.labels().collect();
        assert_eq!(labels, vec!["work", "work (2)", "work (3)"]);
        assert_eq!(directory.get("work (2)").unwrap().address, "b@corp.com");
    }

    #[test]
    fn test_empty_labels_fall_back() {
        let directory = IdentityDirectory::from_identities(vec![
            SenderIdentity::new("", "me@example.com"),
            SenderIdentity::new("", "").with_display_name("Shared inbox"),
            SenderIdentity::new(" ", ""),
        ]);
        let labels: Vec<_> = directory.labels().collect();
        assert_eq!(labels, vec!["me@example.com", "Shared inbox", "Account 3"]);
    }

    #[test]
    fn test_resolve_unknown_is_validation_error() {
        let directory =
            IdentityDirectory::from_identities(vec![SenderIdentity::new("me", "me@example.com")]);
        assert_eq!(directory.resolve(" me ").unwrap().address, "me@example.com");
        assert_eq!(
            directory.resolve("other").unwrap_err(),
            ValidationError::UnknownSender("other".to_string())
        );
    }

    #[test]
    fn test_default_label_prefers_configured() {
        let directory = IdentityDirectory::from_identities(vec![
            SenderIdentity::new("first", "1@example.com"),
            SenderIdentity::new("second", "2@example.com"),
        ]);
        assert_eq!(directory.default_label(Some("second")), Some("second"));
        assert_eq!(directory.default_label(Some("gone")), Some("first"));
        assert_eq!(directory.default_label(None), Some("first"));
        assert_eq!(IdentityDirectory::default().default_label(None), None);
    }
}
