//! Error types for engine operations
//!
//! Every error here is recoverable and reportable; none is fatal to the
//! host process. Validation errors are raised synchronously, before any
//! local mutation, so the in-memory model is never left inconsistent.

use kith_domain::{Tier, UserId};
use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine operation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// The destination tier (or resize target) has no room
    #[error("Capacity exceeded in '{tier}' tier: requested {requested}, available {available}")]
    CapacityExceeded {
        /// The tier that is out of room
        tier: Tier,
        /// Slots the operation needed
        requested: u32,
        /// Slots actually available
        available: u32,
    },

    /// The tier graph does not permit this transition, regardless of capacity
    #[error("Moving from '{from}' to '{to}' is not an allowed edge")]
    NotAnAllowedEdge {
        /// Current tier
        from: Tier,
        /// Requested destination
        to: Tier,
    },

    /// The supplied order does not match current tier membership
    #[error("Invalid reorder: {0}")]
    InvalidReorder(String),

    /// An active link already exists for this ordered (requester, target) pair
    #[error("An active link already exists from {requester} to {target}")]
    AlreadyLinked {
        /// Proposing user
        requester: UserId,
        /// Target user
        target: UserId,
    },

    /// A record, group, link, or link target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed operation input (e.g. a zero-count reserved group)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The tier only accepts records through bulk import
    #[error("Direct adds are disabled for the '{0}' tier")]
    DirectAddDisabled(Tier),

    /// The link is not in a state that permits the requested transition
    #[error("Link transition not permitted: {0}")]
    InvalidLinkState(String),

    /// The acting user is not a party to the link operation
    #[error("User {0} is not permitted to act on this link")]
    NotAParty(UserId),

    /// The remote commit detected a stale view; local state was rolled back
    /// to the last confirmed snapshot
    #[error("Remote commit conflict: refresh local state and retry")]
    RemoteConflict,

    /// The remote commit failed transiently; local state was kept and the
    /// commit may be retried as-is
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),
}
