//! Relationship record module - a named member of exactly one tier

use crate::ids::{ContactMethodId, RecordId};
use crate::tier::Tier;

/// The channel a contact method refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactKind {
    /// Phone number
    Phone,

    /// Email address
    Email,

    /// In-app or platform handle
    Handle,
}

impl ContactKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Phone => "phone",
            ContactKind::Email => "email",
            ContactKind::Handle => "handle",
        }
    }

    /// Parse a kind from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "phone" => Some(ContactKind::Phone),
            "email" => Some(ContactKind::Email),
            "handle" => Some(ContactKind::Handle),
            _ => None,
        }
    }
}

/// A way to reach the person behind a record
///
/// The engine only tracks the capability; the transport used to actually
/// call or message a contact lives outside this core.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMethod {
    /// Unique identifier
    pub id: ContactMethodId,

    /// Channel this method refers to
    pub kind: ContactKind,

    /// Raw value (number, address, or handle)
    pub value: String,

    /// Preferred-channel marker; at most one per record is meaningful
    pub preferred: bool,

    /// Whether the value has been verified against a real account
    pub verified: bool,
}

impl ContactMethod {
    /// Create a new unverified, non-preferred contact method
    pub fn new(kind: ContactKind, value: impl Into<String>) -> Self {
        Self {
            id: ContactMethodId::new(),
            kind,
            value: value.into(),
            preferred: false,
            verified: false,
        }
    }
}

/// A named member of a user's relationship graph
///
/// A record belongs to exactly one tier at a time; `position` values
/// within a tier are unique and kept dense by the engine (renumbered to
/// `0..n-1` after every remove or move).
#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipRecord {
    /// Unique identifier, stable within the owning graph
    pub id: RecordId,

    /// Display name shown to the graph owner
    pub display_name: String,

    /// The tier this record currently occupies
    pub tier: Tier,

    /// Manual position within the tier's order (0-based, dense)
    pub position: u32,

    /// Ways to reach this person
    pub contact_methods: Vec<ContactMethod>,

    /// When this record was created (milliseconds since Unix epoch)
    pub created_at: u64,

    /// Why this person is ranked where they are (ranked tiers only)
    pub ranking_reason: Option<String>,
}

impl RelationshipRecord {
    /// Create a new record at the given tier and position
    pub fn new(
        display_name: impl Into<String>,
        tier: Tier,
        position: u32,
        created_at: u64,
    ) -> Self {
        Self {
            id: RecordId::new(),
            display_name: display_name.into(),
            tier,
            position,
            contact_methods: Vec::new(),
            created_at,
            ranking_reason: None,
        }
    }

    /// The preferred contact method, if one is marked
    pub fn preferred_contact(&self) -> Option<&ContactMethod> {
        self.contact_methods.iter().find(|m| m.preferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_contact() {
        let mut record = RelationshipRecord::new("Alice", Tier::Core, 0, 1000);
        assert!(record.preferred_contact().is_none());

        let mut phone = ContactMethod::new(ContactKind::Phone, "+15551234");
        phone.preferred = true;
        record.contact_methods.push(ContactMethod::new(ContactKind::Email, "a@example.com"));
        record.contact_methods.push(phone);

        let preferred = record.preferred_contact().unwrap();
        assert_eq!(preferred.kind, ContactKind::Phone);
    }

    #[test]
    fn test_contact_kind_parse() {
        assert_eq!(ContactKind::parse("Phone"), Some(ContactKind::Phone));
        assert_eq!(ContactKind::parse("fax"), None);
    }
}
