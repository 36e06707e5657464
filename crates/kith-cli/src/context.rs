//! Shared command context: database access and the graph session.

use crate::config::Config;
use crate::error::{CliError, Result};
use kith_domain::{GraphStore, StoreFailure, Tier, UserId};
use kith_engine::{CircleGraph, CommitError, GraphSession, GraphSnapshot, RemoteCommit};
use kith_store::SqliteStore;
use std::path::{Path, PathBuf};

/// Commit adapter that pushes snapshots into the local SQLite store.
///
/// The store enforces the version check transactionally, so a session
/// talking through this adapter sees the same conflict semantics a
/// networked backend would report.
pub struct SqliteRemote {
    store: SqliteStore,
}

impl RemoteCommit for SqliteRemote {
    async fn commit(
        &mut self,
        owner: UserId,
        expected_version: u64,
        snapshot: &GraphSnapshot,
    ) -> std::result::Result<u64, CommitError> {
        match self
            .store
            .commit_graph(owner, expected_version, &snapshot.records, &snapshot.groups)
        {
            Ok(version) => Ok(version),
            Err(e) if e.is_conflict() => Err(CommitError::Conflict),
            Err(e) => Err(CommitError::Transient(e.to_string())),
        }
    }
}

/// Everything a graph-mutating command needs: the owner, the database
/// path, and a session over the owner's graph.
pub struct GraphContext {
    owner: UserId,
    db_path: PathBuf,
    session: GraphSession<SqliteRemote>,
}

impl GraphContext {
    /// Open the configured database and start a session from the last
    /// committed state of the owner's graph.
    pub fn open(config: &Config, db_override: Option<&str>) -> Result<Self> {
        let owner = config.owner()?;
        let db_path = resolve_db_path(config, db_override);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = SqliteStore::new(&db_path)?;
        let records = store.all_records(owner)?;
        let groups = store.all_groups(owner)?;
        let version = store.graph_version(owner)?;

        tracing::debug!(
            owner = %owner,
            version,
            records = records.len(),
            "graph loaded"
        );

        let graph = CircleGraph::from_parts(owner, records, groups);
        let session = GraphSession::new(graph, version, SqliteRemote { store });

        Ok(Self {
            owner,
            db_path,
            session,
        })
    }

    /// The owner of the session's graph.
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// The working copy of the graph.
    pub fn graph(&self) -> &CircleGraph {
        self.session.graph()
    }

    /// Mutable access to the working copy.
    pub fn graph_mut(&mut self) -> &mut CircleGraph {
        self.session.graph_mut()
    }

    /// Commit local mutations to the store.
    ///
    /// On a version conflict the session has already rolled back; reload
    /// with [`open`](Self::open) before retrying.
    pub async fn commit(&mut self) -> Result<()> {
        self.session.commit().await?;
        Ok(())
    }

    /// Open a separate store connection for link and profile operations.
    pub fn store(&self) -> Result<SqliteStore> {
        Ok(SqliteStore::new(&self.db_path)?)
    }

    /// Load another account's graph with its committed version.
    ///
    /// Used by the link accept path, which materializes a record in the
    /// requester's graph rather than the acting user's.
    pub fn load_peer_graph(&self, store: &SqliteStore, user: UserId) -> Result<(CircleGraph, u64)> {
        let records = store.all_records(user)?;
        let groups = store.all_groups(user)?;
        let version = store.graph_version(user)?;
        Ok((CircleGraph::from_parts(user, records, groups), version))
    }
}

fn resolve_db_path(config: &Config, db_override: Option<&str>) -> PathBuf {
    match db_override {
        Some(path) => Path::new(path).to_path_buf(),
        None => config.db_path.clone(),
    }
}

/// Parse a tier name from user input.
pub fn parse_tier(s: &str) -> Result<Tier> {
    Tier::parse(s).ok_or_else(|| {
        CliError::InvalidInput(format!(
            "unknown tier '{}' (expected one of: {})",
            s,
            Tier::ALL
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })
}
