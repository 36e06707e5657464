//! Optimistic local mutation with remote reconciliation
//!
//! The engine assumes a single logical writer per user graph talking to a
//! remote store over an unreliable network. Mutations apply to an
//! in-memory working copy immediately, so the caller observes consistent
//! invariants without waiting on the network; the commit step is the only
//! asynchronous part. A conflicting commit rolls the working copy back to
//! the last confirmed snapshot and surfaces `RemoteConflict`; the local
//! copy is never left violating the capacity or uniqueness invariants.

use crate::error::{EngineError, Result};
use crate::graph::CircleGraph;
use kith_domain::{RelationshipRecord, ReservedGroup, UserId};

/// The graph state handed to the remote store on commit
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSnapshot {
    /// All records in the graph
    pub records: Vec<RelationshipRecord>,

    /// All reserved groups in the graph
    pub groups: Vec<ReservedGroup>,
}

impl GraphSnapshot {
    /// Capture the current state of a graph
    pub fn of(graph: &CircleGraph) -> Self {
        Self {
            records: graph.records().to_vec(),
            groups: graph.groups().to_vec(),
        }
    }
}

/// Commit failure classification
///
/// A conflict means another session moved the remote version forward; the
/// caller must refresh and retry the original intent against fresh data.
/// A transient failure keeps local state and may be retried as-is.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitError {
    /// The remote version did not match the expected one
    Conflict,

    /// Network or store fault; nothing was committed
    Transient(String),
}

/// Trait for the asynchronous remote commit step
///
/// The only cancellable operation in the engine: a commit future dropped
/// before acknowledgement has no local side effects.
pub trait RemoteCommit {
    /// Persist a snapshot if the remote version still matches
    /// `expected_version`; returns the new version on success
    fn commit(
        &mut self,
        owner: UserId,
        expected_version: u64,
        snapshot: &GraphSnapshot,
    ) -> impl std::future::Future<Output = std::result::Result<u64, CommitError>> + Send;
}

/// A single-writer session over one user's graph
///
/// Holds the working copy (what the caller sees and mutates) and the last
/// confirmed snapshot (what the remote store acknowledged). Every
/// operation takes `&mut self`, which serializes the graph to one logical
/// writer; capacity and ordering reads inside an operation therefore
/// always see the same snapshot as the mutation they guard.
pub struct GraphSession<S: RemoteCommit> {
    confirmed: CircleGraph,
    working: CircleGraph,
    version: u64,
    remote: S,
}

impl<S: RemoteCommit> GraphSession<S> {
    /// Start a session from the last state the remote store confirmed
    pub fn new(confirmed: CircleGraph, version: u64, remote: S) -> Self {
        Self {
            working: confirmed.clone(),
            confirmed,
            version,
            remote,
        }
    }

    /// The graph as the caller currently sees it (uncommitted mutations
    /// included)
    pub fn graph(&self) -> &CircleGraph {
        &self.working
    }

    /// Mutable access to the working copy
    ///
    /// Mutations are local until [`commit`](Self::commit) succeeds.
    pub fn graph_mut(&mut self) -> &mut CircleGraph {
        &mut self.working
    }

    /// The remote version this session last confirmed
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether the working copy has diverged from the confirmed snapshot
    pub fn is_dirty(&self) -> bool {
        self.working != self.confirmed
    }

    /// Push the working copy to the remote store
    ///
    /// On success the working copy becomes the confirmed snapshot. On a
    /// version conflict the working copy is rolled back to the confirmed
    /// snapshot and `RemoteConflict` is returned; the caller must refresh
    /// (see [`adopt`](Self::adopt)) before retrying the original intent.
    /// On a transient failure local state is kept and the commit may be
    /// retried unchanged.
    pub async fn commit(&mut self) -> Result<()> {
        if !self.is_dirty() {
            tracing::debug!(owner = %self.working.owner(), "commit skipped, no local changes");
            return Ok(());
        }

        let snapshot = GraphSnapshot::of(&self.working);
        match self
            .remote
            .commit(self.working.owner(), self.version, &snapshot)
            .await
        {
            Ok(new_version) => {
                tracing::debug!(
                    owner = %self.working.owner(),
                    version = new_version,
                    "commit acknowledged"
                );
                self.version = new_version;
                self.confirmed = self.working.clone();
                Ok(())
            }
            Err(CommitError::Conflict) => {
                tracing::warn!(
                    owner = %self.working.owner(),
                    version = self.version,
                    "commit conflict, rolling back working copy"
                );
                self.working = self.confirmed.clone();
                Err(EngineError::RemoteConflict)
            }
            Err(CommitError::Transient(reason)) => {
                tracing::warn!(owner = %self.working.owner(), %reason, "commit failed transiently");
                Err(EngineError::RemoteUnavailable(reason))
            }
        }
    }

    /// Discard uncommitted local mutations
    pub fn rollback(&mut self) {
        self.working = self.confirmed.clone();
    }

    /// Adopt fresh remote state after a conflict
    ///
    /// Replaces both the confirmed and working copies; any uncommitted
    /// local mutations are discarded.
    pub fn adopt(&mut self, graph: CircleGraph, version: u64) {
        self.confirmed = graph.clone();
        self.working = graph;
        self.version = version;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::RecordDraft;
    use kith_domain::Tier;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Remote that acknowledges every commit and counts them
    struct AckRemote {
        commits: Arc<AtomicU64>,
    }

    impl RemoteCommit for AckRemote {
        async fn commit(
            &mut self,
            _owner: UserId,
            expected_version: u64,
            _snapshot: &GraphSnapshot,
        ) -> std::result::Result<u64, CommitError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(expected_version + 1)
        }
    }

    /// Remote that reports a conflict on every commit
    struct ConflictRemote;

    impl RemoteCommit for ConflictRemote {
        async fn commit(
            &mut self,
            _owner: UserId,
            _expected_version: u64,
            _snapshot: &GraphSnapshot,
        ) -> std::result::Result<u64, CommitError> {
            Err(CommitError::Conflict)
        }
    }

    /// Remote that fails transiently on every commit
    struct FlakyRemote;

    impl RemoteCommit for FlakyRemote {
        async fn commit(
            &mut self,
            _owner: UserId,
            _expected_version: u64,
            _snapshot: &GraphSnapshot,
        ) -> std::result::Result<u64, CommitError> {
            Err(CommitError::Transient("connection reset".to_string()))
        }
    }

    fn empty_graph() -> CircleGraph {
        CircleGraph::new(UserId::new())
    }

    #[tokio::test]
    async fn test_commit_confirms_working_copy() {
        let commits = Arc::new(AtomicU64::new(0));
        let mut session = GraphSession::new(
            empty_graph(),
            0,
            AckRemote {
                commits: commits.clone(),
            },
        );

        session
            .graph_mut()
            .add_record(Tier::Core, RecordDraft::named("Alice"))
            .unwrap();
        assert!(session.is_dirty());

        session.commit().await.unwrap();
        assert!(!session.is_dirty());
        assert_eq!(session.version(), 1);
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clean_commit_skips_remote() {
        let commits = Arc::new(AtomicU64::new(0));
        let mut session = GraphSession::new(
            empty_graph(),
            3,
            AckRemote {
                commits: commits.clone(),
            },
        );

        session.commit().await.unwrap();
        assert_eq!(session.version(), 3);
        assert_eq!(commits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_to_confirmed() {
        let mut session = GraphSession::new(empty_graph(), 0, ConflictRemote);

        session
            .graph_mut()
            .add_record(Tier::Core, RecordDraft::named("Alice"))
            .unwrap();

        let err = session.commit().await.unwrap_err();
        assert_eq!(err, EngineError::RemoteConflict);

        // The optimistic mutation is gone; invariants hold
        assert!(session.graph().records().is_empty());
        assert!(!session.is_dirty());
        session.graph().check_invariants().unwrap();
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_local_state() {
        let mut session = GraphSession::new(empty_graph(), 0, FlakyRemote);

        session
            .graph_mut()
            .add_record(Tier::Core, RecordDraft::named("Alice"))
            .unwrap();

        let err = session.commit().await.unwrap_err();
        assert!(matches!(err, EngineError::RemoteUnavailable(_)));

        // The mutation survives; the commit may be retried as-is
        assert_eq!(session.graph().records().len(), 1);
        assert!(session.is_dirty());
    }

    #[tokio::test]
    async fn test_adopt_replaces_both_copies() {
        let mut session = GraphSession::new(empty_graph(), 0, ConflictRemote);
        session
            .graph_mut()
            .add_record(Tier::Core, RecordDraft::named("Stale"))
            .unwrap();

        let mut fresh = empty_graph();
        fresh
            .add_record(Tier::Core, RecordDraft::named("Fresh"))
            .unwrap();

        session.adopt(fresh, 7);
        assert_eq!(session.version(), 7);
        assert!(!session.is_dirty());
        assert_eq!(session.graph().records()[0].display_name, "Fresh");
    }
}
