//! Kith Domain Layer
//!
//! This crate contains the core domain model for Kith: capacity-bounded
//! relationship circles ("tiers"), the records and reserved slots that
//! occupy them, and the cross-graph connection links between two users.
//! It has no dependencies beyond `uuid` and defines the fundamental
//! concepts, value objects, and trait interfaces that all other layers
//! depend upon.
//!
//! ## Key Concepts
//!
//! - **Tier**: a fixed, capacity-bounded relationship circle with an
//!   allow-list of legal movement destinations
//! - **RelationshipRecord**: a named member of exactly one tier, with a
//!   stable position in that tier's manual order
//! - **ReservedGroup**: anonymous capacity held against a tier's limit
//! - **ConnectionLink**: a consent-based link between two users' graphs
//! - **TierCapacity**: the pure used/reserved/available accounting that
//!   every mutating operation consults before touching state
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure domain logic only
//! - Infrastructure implementations live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod capacity;
pub mod ids;
pub mod link;
pub mod record;
pub mod reserved;
pub mod tier;
pub mod traits;

// Re-exports for convenience
pub use capacity::TierCapacity;
pub use ids::{ContactMethodId, GroupId, LinkId, RecordId, UserId};
pub use link::{ConnectionLink, LinkStatus};
pub use record::{ContactKind, ContactMethod, RelationshipRecord};
pub use reserved::ReservedGroup;
pub use tier::{Tier, TierDefinition};
pub use traits::{GraphStore, Identifier, IdentityResolver, ResolvedIdentity, StoreFailure};
