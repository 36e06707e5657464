//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Infrastructure implementations live in other crates.

use crate::ids::{GroupId, LinkId, RecordId, UserId};
use crate::link::ConnectionLink;
use crate::record::{ContactKind, RelationshipRecord};
use crate::reserved::ReservedGroup;
use crate::tier::Tier;

/// Failure classification for persistence errors
///
/// The persistence collaborator must report version conflicts
/// distinguishably from transient failures: a conflict requires the
/// caller to refetch and reconcile, a transient failure may simply be
/// retried.
pub trait StoreFailure {
    /// Whether this failure is a stale-version conflict
    fn is_conflict(&self) -> bool;
}

/// Trait for persisting and retrieving one user's relationship graph
///
/// Implemented by the infrastructure layer (kith-store). All operations
/// are keyed by the owning user's graph.
pub trait GraphStore {
    /// Error type for store operations
    type Error: StoreFailure;

    /// Insert or replace a relationship record
    fn put_record(&mut self, owner: UserId, record: &RelationshipRecord) -> Result<(), Self::Error>;

    /// Get a record by id
    fn get_record(&self, owner: UserId, id: RecordId) -> Result<Option<RelationshipRecord>, Self::Error>;

    /// Delete a record by id
    fn delete_record(&mut self, owner: UserId, id: RecordId) -> Result<(), Self::Error>;

    /// Fetch all records for one tier, in position order
    fn records_for_tier(&self, owner: UserId, tier: Tier) -> Result<Vec<RelationshipRecord>, Self::Error>;

    /// Fetch the whole graph's records
    fn all_records(&self, owner: UserId) -> Result<Vec<RelationshipRecord>, Self::Error>;

    /// Insert or replace a reserved group
    fn put_group(&mut self, owner: UserId, group: &ReservedGroup) -> Result<(), Self::Error>;

    /// Delete a reserved group by id
    fn delete_group(&mut self, owner: UserId, id: GroupId) -> Result<(), Self::Error>;

    /// Fetch all reserved groups for the graph
    fn all_groups(&self, owner: UserId) -> Result<Vec<ReservedGroup>, Self::Error>;

    /// Insert or replace a connection link
    fn put_link(&mut self, link: &ConnectionLink) -> Result<(), Self::Error>;

    /// Get a link by id
    fn get_link(&self, id: LinkId) -> Result<Option<ConnectionLink>, Self::Error>;

    /// Delete a link by id
    fn delete_link(&mut self, id: LinkId) -> Result<(), Self::Error>;

    /// Fetch all links involving the given user, on either side
    fn links_for_user(&self, user: UserId) -> Result<Vec<ConnectionLink>, Self::Error>;
}

/// An exact identifier a link target can be resolved by
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// Platform handle
    Handle(String),

    /// A verified contact-method value previously recorded by some user
    ContactValue(ContactKind, String),
}

/// A resolved link target
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    /// The account the identifier resolved to
    pub user_id: UserId,

    /// Profile display name for user messaging
    pub display_name: String,

    /// The contact-method record the identifier matched, if resolution
    /// went through a recorded contact value (kept for provenance)
    pub matched_contact_method: Option<crate::ids::ContactMethodId>,
}

/// Trait for resolving a handle or contact value to a user account
///
/// Implemented by the identity-resolution collaborator. Resolution is
/// exact-match only; fuzzy matching across unrelated accounts is out of
/// scope. `Ok(None)` means the identifier names no known account.
pub trait IdentityResolver {
    /// Error type for resolution failures (transport, not "not found")
    type Error;

    /// Resolve an identifier to a candidate account
    fn resolve(&self, identifier: &Identifier) -> Result<Option<ResolvedIdentity>, Self::Error>;
}
