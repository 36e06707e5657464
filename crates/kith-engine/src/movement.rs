//! Movement validation - legal tier transitions for existing members
//!
//! The edge check and the capacity check are deliberately separate
//! outcomes: an illegal edge is a permanent constraint, a full destination
//! is a transient one (freed by removing or moving someone else first),
//! and callers surface them differently.

use kith_domain::{Tier, TierCapacity};

/// Outcome of validating a single tier transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCheck {
    /// The move is legal and the destination has room
    Allowed,

    /// The tier graph does not permit this transition, regardless of capacity
    NotAnAllowedEdge,

    /// The edge is legal but the destination is full
    DestinationFull,
}

/// Whether a legal move goes toward or away from the innermost circle
///
/// Derived from the tiers' intimacy ranks; used only for UI affordances,
/// never for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Toward a more intimate tier
    Promote,

    /// Toward a less intimate tier
    Demote,
}

/// One legal destination for a record, with its current viability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementOption {
    /// The destination tier
    pub tier: Tier,

    /// Whether the move would currently succeed
    pub check: MoveCheck,

    /// Promote/demote affordance relative to the current tier
    pub direction: MoveDirection,
}

/// Validate moving a member from `from` to `to` given the destination's
/// capacity snapshot
pub fn check_move(from: Tier, to: Tier, destination: &TierCapacity) -> MoveCheck {
    if !from.allowed_destinations().contains(&to) {
        return MoveCheck::NotAnAllowedEdge;
    }
    if !destination.has_room_for(1) {
        return MoveCheck::DestinationFull;
    }
    MoveCheck::Allowed
}

/// Derive the promote/demote affordance for a legal edge
pub fn direction_of(from: Tier, to: Tier) -> MoveDirection {
    if to.rank() < from.rank() {
        MoveDirection::Promote
    } else {
        MoveDirection::Demote
    }
}
