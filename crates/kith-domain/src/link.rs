//! Connection link module - consent-based links between two user graphs

use crate::ids::{ContactMethodId, LinkId, RecordId, UserId};
use crate::tier::Tier;

/// Lifecycle state of a connection link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Proposed, awaiting the target's decision
    Pending,

    /// Accepted by the target; visible from both graphs
    Accepted,

    /// Rejected by the target; terminal
    Rejected,
}

impl LinkStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Accepted => "accepted",
            LinkStatus::Rejected => "rejected",
        }
    }

    /// Parse a status from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(LinkStatus::Pending),
            "accepted" => Some(LinkStatus::Accepted),
            "rejected" => Some(LinkStatus::Rejected),
            _ => None,
        }
    }
}

/// A mutual-connection link between two distinct user graphs
///
/// At most one active (pending or accepted) link may exist per ordered
/// (requester, target) pair. Acceptance is a single atomic transition
/// visible to both graphs; revocation deletes the link without deleting
/// the underlying records on either side.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionLink {
    /// Unique identifier
    pub id: LinkId,

    /// The user who proposed the link
    pub requester: UserId,

    /// The user being linked to
    pub target: UserId,

    /// Display name the target resolved to at proposal time, for user
    /// messaging on both sides
    pub target_display_name: String,

    /// The tier the requester proposed placing the target in
    pub proposed_tier: Tier,

    /// The requester-side record materialized at acceptance, if any
    ///
    /// Revoking the link never deletes this record; the tier disclosed to
    /// the target is read live from it.
    pub linked_record: Option<RecordId>,

    /// The contact method the target was resolved through, for provenance
    pub matched_contact_method: Option<ContactMethodId>,

    /// Whether the requester's tier assignment is visible to the target
    pub disclose_circle: bool,

    /// Current lifecycle state
    pub status: LinkStatus,

    /// When the link was proposed (milliseconds since Unix epoch)
    pub created_at: u64,

    /// When the link was accepted or rejected
    pub resolved_at: Option<u64>,
}

impl ConnectionLink {
    /// Whether this link blocks a new proposal for the same ordered pair
    pub fn is_active(&self) -> bool {
        matches!(self.status, LinkStatus::Pending | LinkStatus::Accepted)
    }

    /// Whether the given user is one of the two parties
    pub fn involves(&self, user: UserId) -> bool {
        self.requester == user || self.target == user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_states() {
        let mut link = ConnectionLink {
            id: LinkId::new(),
            requester: UserId::new(),
            target: UserId::new(),
            target_display_name: "Yara".to_string(),
            proposed_tier: Tier::Close,
            linked_record: None,
            matched_contact_method: None,
            disclose_circle: true,
            status: LinkStatus::Pending,
            created_at: 1000,
            resolved_at: None,
        };

        assert!(link.is_active());
        link.status = LinkStatus::Accepted;
        assert!(link.is_active());
        link.status = LinkStatus::Rejected;
        assert!(!link.is_active());
    }
}
