//! Connection linker - consent-based links across two user graphs
//!
//! State machine per ordered (requester, target) pair:
//!
//! ```text
//! [no link] --propose--> [pending]
//! [pending] --accept--> [accepted]   (materializes a record on the
//!                                     requester's side if none is linked)
//! [pending] --reject--> [no link]
//! [accepted] --revoke (either side)--> [no link]
//! ```
//!
//! Acceptance is side-effect-bearing on exactly one side: the accepting
//! user never gains a record in their own graph. Being added to someone's
//! circle must not silently add them to yours.

use crate::error::{EngineError, Result};
use crate::graph::{CircleGraph, RecordDraft};
use kith_domain::traits::{Identifier, IdentityResolver};
use kith_domain::{ConnectionLink, LinkId, LinkStatus, Tier, UserId};
use std::time::{SystemTime, UNIX_EPOCH};

/// One party's view of a connection link
///
/// The proposer's tier assignment is suppressed from the target's view
/// when `disclose_circle` is off; the link itself stays visible. When
/// disclosed, the tier is a live reference to the requester-side record's
/// current tier, consistent with every other tier-membership read.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkView {
    /// The link being viewed
    pub link_id: LinkId,

    /// The other party
    pub counterpart: UserId,

    /// Display name of the link target (same from both sides)
    pub target_display_name: String,

    /// The requester's tier assignment, if visible to this viewer
    pub tier: Option<Tier>,

    /// Current lifecycle state
    pub status: LinkStatus,

    /// Whether the viewer is the proposing side
    pub is_requester: bool,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Cross-graph link table plus the identity collaborator
///
/// Owns the authoritative collection of [`ConnectionLink`]s spanning user
/// graphs. Each mutating operation validates completely before touching
/// state.
pub struct ConnectionLinker<R: IdentityResolver> {
    links: Vec<ConnectionLink>,
    resolver: R,
}

impl<R: IdentityResolver> ConnectionLinker<R>
where
    R::Error: std::fmt::Display,
{
    /// Create a linker with no links
    pub fn new(resolver: R) -> Self {
        Self {
            links: Vec::new(),
            resolver,
        }
    }

    /// Rebuild a linker from persisted links
    pub fn from_links(resolver: R, links: Vec<ConnectionLink>) -> Self {
        Self { links, resolver }
    }

    /// All links involving the given user, on either side
    pub fn links_for(&self, user: UserId) -> Vec<&ConnectionLink> {
        self.links.iter().filter(|l| l.involves(user)).collect()
    }

    /// Get a link by id
    pub fn get_link(&self, id: LinkId) -> Option<&ConnectionLink> {
        self.links.iter().find(|l| l.id == id)
    }

    /// Propose a link from the requester to whoever `identifier` resolves to
    ///
    /// Fails with `NotFound` if resolution misses (or names the requester
    /// themselves), `AlreadyLinked` if an active link exists for the
    /// ordered pair, and `CapacityExceeded` if the requester's proposed
    /// tier has no room for the record that acceptance would materialize.
    /// The proposed tier must also admit the record acceptance creates:
    /// import-only tiers raise `DirectAddDisabled` and one-directional
    /// tiers raise `InvalidInput` at proposal time, so a pending link is
    /// always acceptable if capacity holds.
    pub fn propose(
        &mut self,
        requester: &CircleGraph,
        identifier: &Identifier,
        proposed_tier: Tier,
        disclose_circle: bool,
    ) -> Result<&ConnectionLink> {
        let definition = proposed_tier.definition();
        if !definition.direct_add {
            return Err(EngineError::DirectAddDisabled(proposed_tier));
        }
        if !definition.reciprocal {
            return Err(EngineError::InvalidInput(format!(
                "the '{}' tier is one-directional and cannot hold a mutual link",
                proposed_tier
            )));
        }

        let resolved = self
            .resolver
            .resolve(identifier)
            .map_err(|e| EngineError::RemoteUnavailable(e.to_string()))?
            .ok_or_else(|| EngineError::NotFound(format!("no account matches {:?}", identifier)))?;

        if resolved.user_id == requester.owner() {
            // An identifier naming the requester is not a linkable counterpart
            return Err(EngineError::NotFound(
                "identifier resolves to the requesting account".to_string(),
            ));
        }

        if self.links.iter().any(|l| {
            l.requester == requester.owner() && l.target == resolved.user_id && l.is_active()
        }) {
            return Err(EngineError::AlreadyLinked {
                requester: requester.owner(),
                target: resolved.user_id,
            });
        }

        let capacity = requester.capacity(proposed_tier);
        if !capacity.has_room_for(1) {
            return Err(EngineError::CapacityExceeded {
                tier: proposed_tier,
                requested: 1,
                available: capacity.available,
            });
        }

        let link = ConnectionLink {
            id: LinkId::new(),
            requester: requester.owner(),
            target: resolved.user_id,
            target_display_name: resolved.display_name,
            proposed_tier,
            linked_record: None,
            matched_contact_method: resolved.matched_contact_method,
            disclose_circle,
            status: LinkStatus::Pending,
            created_at: now_millis(),
            resolved_at: None,
        };

        tracing::info!(
            link = %link.id,
            requester = %link.requester,
            target = %link.target,
            tier = %proposed_tier,
            disclose = disclose_circle,
            "link proposed"
        );

        self.links.push(link);
        Ok(self.links.last().unwrap())
    }

    /// Accept a pending link, acting as the target
    ///
    /// Materializes a relationship record in the *requester's* graph at
    /// the proposed tier if the link has none yet. The accepting user's
    /// own graph is untouched; adding the requester there is a separate,
    /// explicit action.
    pub fn accept(
        &mut self,
        id: LinkId,
        acting: UserId,
        requester_graph: &mut CircleGraph,
    ) -> Result<&ConnectionLink> {
        let link = self
            .links
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("link {}", id)))?;

        if link.target != acting {
            return Err(EngineError::NotAParty(acting));
        }
        if link.status != LinkStatus::Pending {
            return Err(EngineError::InvalidLinkState(format!(
                "accept requires a pending link, found '{}'",
                link.status.as_str()
            )));
        }
        if link.requester != requester_graph.owner() {
            return Err(EngineError::InvalidInput(
                "supplied graph does not belong to the link's requester".to_string(),
            ));
        }

        let proposed_tier = link.proposed_tier;
        let display_name = link.target_display_name.clone();

        // Capacity may have been consumed since the proposal; acceptance
        // must not drive the requester's tier over its limit.
        let linked_record = if link.linked_record.is_none() {
            let record = requester_graph.add_record(proposed_tier, RecordDraft::named(display_name))?;
            Some(record.id)
        } else {
            link.linked_record
        };

        let link = self
            .links
            .iter_mut()
            .find(|l| l.id == id)
            .expect("link existence checked above");
        link.status = LinkStatus::Accepted;
        link.resolved_at = Some(now_millis());
        link.linked_record = linked_record;

        tracing::info!(link = %id, "link accepted");
        Ok(&*link)
    }

    /// Reject a pending link, acting as the target
    ///
    /// Returns the final state of the link; the pair is back to "no link"
    /// and a fresh proposal is permitted.
    pub fn reject(&mut self, id: LinkId, acting: UserId) -> Result<ConnectionLink> {
        let index = self
            .links
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("link {}", id)))?;

        if self.links[index].target != acting {
            return Err(EngineError::NotAParty(acting));
        }
        if self.links[index].status != LinkStatus::Pending {
            return Err(EngineError::InvalidLinkState(format!(
                "reject requires a pending link, found '{}'",
                self.links[index].status.as_str()
            )));
        }

        let mut link = self.links.remove(index);
        link.status = LinkStatus::Rejected;
        link.resolved_at = Some(now_millis());

        tracing::info!(link = %id, "link rejected");
        Ok(link)
    }

    /// Revoke an accepted link from either side
    ///
    /// The link disappears from both parties' views; neither side's
    /// relationship records are deleted.
    pub fn revoke(&mut self, id: LinkId, acting: UserId) -> Result<()> {
        let index = self
            .links
            .iter()
            .position(|l| l.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("link {}", id)))?;

        if !self.links[index].involves(acting) {
            return Err(EngineError::NotAParty(acting));
        }
        if self.links[index].status != LinkStatus::Accepted {
            return Err(EngineError::InvalidLinkState(format!(
                "revoke requires an accepted link, found '{}'",
                self.links[index].status.as_str()
            )));
        }

        self.links.remove(index);
        tracing::info!(link = %id, revoked_by = %acting, "link revoked");
        Ok(())
    }

    /// One party's view of a link
    ///
    /// `requester_graph` supplies the live tier read for disclosure; pass
    /// the graph owned by the link's requester.
    pub fn view_for(
        &self,
        id: LinkId,
        viewer: UserId,
        requester_graph: &CircleGraph,
    ) -> Result<LinkView> {
        let link = self
            .get_link(id)
            .ok_or_else(|| EngineError::NotFound(format!("link {}", id)))?;

        if !link.involves(viewer) {
            return Err(EngineError::NotAParty(viewer));
        }

        let is_requester = link.requester == viewer;

        // Live tier: the materialized record's current tier wins over the
        // tier proposed at link creation.
        let live_tier = link
            .linked_record
            .and_then(|rid| requester_graph.get_record(rid))
            .map(|r| r.tier)
            .unwrap_or(link.proposed_tier);

        let tier = if is_requester || link.disclose_circle {
            Some(live_tier)
        } else {
            None
        };

        Ok(LinkView {
            link_id: link.id,
            counterpart: if is_requester { link.target } else { link.requester },
            target_display_name: link.target_display_name.clone(),
            tier,
            status: link.status,
            is_requester,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kith_domain::traits::{Identifier, ResolvedIdentity};
    use std::collections::HashMap;

    /// Resolver over a fixed handle directory
    struct FixedResolver {
        by_handle: HashMap<String, ResolvedIdentity>,
    }

    impl FixedResolver {
        fn with(entries: &[(&str, UserId)]) -> Self {
            let by_handle = entries
                .iter()
                .map(|(handle, user)| {
                    (
                        handle.to_string(),
                        ResolvedIdentity {
                            user_id: *user,
                            display_name: handle.to_string(),
                            matched_contact_method: None,
                        },
                    )
                })
                .collect();
            Self { by_handle }
        }
    }

    impl IdentityResolver for FixedResolver {
        type Error = String;

        fn resolve(
            &self,
            identifier: &Identifier,
        ) -> std::result::Result<Option<ResolvedIdentity>, String> {
            match identifier {
                Identifier::Handle(h) => Ok(self.by_handle.get(h).cloned()),
                Identifier::ContactValue(..) => Ok(None),
            }
        }
    }

    fn setup() -> (CircleGraph, UserId, ConnectionLinker<FixedResolver>) {
        let requester = CircleGraph::new(UserId::new());
        let target = UserId::new();
        let linker = ConnectionLinker::new(FixedResolver::with(&[("yara", target)]));
        (requester, target, linker)
    }

    fn handle(h: &str) -> Identifier {
        Identifier::Handle(h.to_string())
    }

    #[test]
    fn test_propose_unknown_identifier_is_not_found() {
        let (requester, _, mut linker) = setup();
        let err = linker
            .propose(&requester, &handle("nobody"), Tier::Close, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_propose_rejects_second_active_link() {
        let (requester, target, mut linker) = setup();
        linker
            .propose(&requester, &handle("yara"), Tier::Close, true)
            .unwrap();

        let err = linker
            .propose(&requester, &handle("yara"), Tier::Network, true)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::AlreadyLinked {
                requester: requester.owner(),
                target,
            }
        );
    }

    #[test]
    fn test_propose_into_import_only_tier_is_rejected() {
        let (requester, _, mut linker) = setup();
        let err = linker
            .propose(&requester, &handle("yara"), Tier::Acquainted, true)
            .unwrap_err();
        assert_eq!(err, EngineError::DirectAddDisabled(Tier::Acquainted));

        // No pending link is left behind that acceptance could never clear
        assert!(linker.links_for(requester.owner()).is_empty());
    }

    #[test]
    fn test_propose_into_one_directional_tier_is_rejected() {
        let (requester, _, mut linker) = setup();
        let err = linker
            .propose(&requester, &handle("yara"), Tier::Parasocial, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
        assert!(linker.links_for(requester.owner()).is_empty());
    }

    #[test]
    fn test_propose_requires_requester_capacity() {
        let (mut requester, _, mut linker) = setup();
        for i in 0..5 {
            requester
                .add_record(Tier::Core, RecordDraft::named(format!("p{}", i)))
                .unwrap();
        }

        let err = linker
            .propose(&requester, &handle("yara"), Tier::Core, true)
            .unwrap_err();
        assert!(matches!(err, EngineError::CapacityExceeded { tier: Tier::Core, .. }));
    }

    #[test]
    fn test_accept_materializes_on_requester_side_only() {
        let (mut requester, target, mut linker) = setup();
        let link_id = linker
            .propose(&requester, &handle("yara"), Tier::Close, true)
            .unwrap()
            .id;

        assert!(requester.records().is_empty());
        let link = linker.accept(link_id, target, &mut requester).unwrap();
        assert_eq!(link.status, LinkStatus::Accepted);

        let record_id = link.linked_record.unwrap();
        let record = requester.get_record(record_id).unwrap();
        assert_eq!(record.tier, Tier::Close);
        assert_eq!(record.display_name, "yara");
    }

    #[test]
    fn test_accept_by_requester_is_rejected() {
        let (mut requester, _, mut linker) = setup();
        let owner = requester.owner();
        let link_id = linker
            .propose(&requester, &handle("yara"), Tier::Close, true)
            .unwrap()
            .id;

        let err = linker.accept(link_id, owner, &mut requester).unwrap_err();
        assert_eq!(err, EngineError::NotAParty(owner));
    }

    #[test]
    fn test_reject_returns_pair_to_no_link() {
        let (mut requester, target, mut linker) = setup();
        let link_id = linker
            .propose(&requester, &handle("yara"), Tier::Close, true)
            .unwrap()
            .id;

        let rejected = linker.reject(link_id, target).unwrap();
        assert_eq!(rejected.status, LinkStatus::Rejected);
        assert!(linker.get_link(link_id).is_none());

        // A fresh proposal is permitted again
        assert!(linker
            .propose(&requester, &handle("yara"), Tier::Close, true)
            .is_ok());
        let _ = requester;
    }

    #[test]
    fn test_revoke_from_either_side_removes_both_views() {
        for revoker_is_target in [false, true] {
            let (mut requester, target, mut linker) = setup();
            let link_id = linker
                .propose(&requester, &handle("yara"), Tier::Close, true)
                .unwrap()
                .id;
            linker.accept(link_id, target, &mut requester).unwrap();

            let acting = if revoker_is_target { target } else { requester.owner() };
            linker.revoke(link_id, acting).unwrap();

            assert!(linker.links_for(requester.owner()).is_empty());
            assert!(linker.links_for(target).is_empty());
            // The materialized record survives revocation
            assert_eq!(requester.records().len(), 1);
        }
    }

    #[test]
    fn test_revoke_requires_accepted_state() {
        let (requester, target, mut linker) = setup();
        let link_id = linker
            .propose(&requester, &handle("yara"), Tier::Close, true)
            .unwrap()
            .id;

        let err = linker.revoke(link_id, target).unwrap_err();
        assert!(matches!(err, EngineError::InvalidLinkState(_)));
    }

    #[test]
    fn test_undisclosed_tier_hidden_from_target_only() {
        // disclose_circle = false hides the tier from the
        // target while the requester still sees it privately
        let (mut requester, target, mut linker) = setup();
        let link_id = linker
            .propose(&requester, &handle("yara"), Tier::Core, false)
            .unwrap()
            .id;
        linker.accept(link_id, target, &mut requester).unwrap();

        let target_view = linker.view_for(link_id, target, &requester).unwrap();
        assert_eq!(target_view.tier, None);
        assert_eq!(target_view.status, LinkStatus::Accepted);

        let requester_view = linker
            .view_for(link_id, requester.owner(), &requester)
            .unwrap();
        assert_eq!(requester_view.tier, Some(Tier::Core));
    }

    #[test]
    fn test_disclosed_tier_is_a_live_reference() {
        let (mut requester, target, mut linker) = setup();
        let link_id = linker
            .propose(&requester, &handle("yara"), Tier::Core, true)
            .unwrap()
            .id;
        linker.accept(link_id, target, &mut requester).unwrap();

        let record_id = linker.get_link(link_id).unwrap().linked_record.unwrap();
        requester.move_record(record_id, Tier::Sympathy).unwrap();

        // Both sides now observe the moved tier, not the proposal snapshot
        let target_view = linker.view_for(link_id, target, &requester).unwrap();
        assert_eq!(target_view.tier, Some(Tier::Sympathy));
    }

    #[test]
    fn test_views_match_modulo_disclosure() {
        let (mut requester, target, mut linker) = setup();
        let link_id = linker
            .propose(&requester, &handle("yara"), Tier::Close, true)
            .unwrap()
            .id;
        linker.accept(link_id, target, &mut requester).unwrap();

        let rv = linker.view_for(link_id, requester.owner(), &requester).unwrap();
        let tv = linker.view_for(link_id, target, &requester).unwrap();
        assert_eq!(rv.status, tv.status);
        assert_eq!(rv.tier, tv.tier);
        assert_eq!(rv.target_display_name, tv.target_display_name);
        assert_eq!(rv.counterpart, target);
        assert_eq!(tv.counterpart, requester.owner());
    }
}
