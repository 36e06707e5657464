//! Kith Tier Capacity & Connection Engine
//!
//! The invariant-preserving operations over a user's relationship graph:
//! capacity-checked adds, allow-list-validated moves, dense manual
//! ordering, anonymous reserved slots, consent-based cross-graph links,
//! bulk import, and optimistic remote reconciliation.
//!
//! ## Design
//!
//! Validation (capacity, movement edges, reorder sets) is synchronous and
//! pure; only the remote commit suspends. Every public operation either
//! completes fully or leaves the graph untouched, so the capacity
//! invariant `used + reserved <= limit` and the dense-ordering invariant
//! hold after every completed operation, under arbitrary operation
//! sequences. This crate is a library-level contract; it mandates no wire
//! format and no UI.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod graph;
pub mod import;
pub mod linker;
pub mod movement;
pub mod session;

// Re-exports for convenience
pub use error::{EngineError, Result};
pub use graph::{CircleGraph, RecordDraft, RecordPatch};
pub use import::{import_batch, ImportCandidate, ImportOutcome};
pub use linker::{ConnectionLinker, LinkView};
pub use movement::{check_move, direction_of, MoveCheck, MoveDirection, MovementOption};
pub use session::{CommitError, GraphSession, GraphSnapshot, RemoteCommit};
