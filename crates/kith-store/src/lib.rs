//! Kith Storage Layer
//!
//! Implements the `GraphStore` trait over SQLite, plus the versioned
//! `commit_graph` step the optimistic session builds on and a local
//! identity directory backing `IdentityResolver`.
//!
//! # Architecture
//!
//! - One row per record/group/link, keyed by 16-byte UUID blobs
//! - A per-owner version counter bumped inside the same transaction that
//!   replaces the graph's rows, so stale commits surface as
//!   [`StoreError::Conflict`] rather than silent overwrites
//!
//! # Examples
//!
//! ```no_run
//! use kith_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for graph operations
//! ```

#![warn(missing_docs)]

use kith_domain::traits::{GraphStore, Identifier, IdentityResolver, ResolvedIdentity, StoreFailure};
use kith_domain::{
    ConnectionLink, ContactKind, ContactMethod, ContactMethodId, GroupId, LinkId, LinkStatus,
    RecordId, RelationshipRecord, ReservedGroup, Tier, UserId,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stale-version commit rejected
    #[error("Version conflict: expected {expected}, store holds {actual}")]
    Conflict {
        /// Version the committer believed was current
        expected: u64,
        /// Version the store actually holds
        actual: u64,
    },

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Handle already registered to another account
    #[error("Handle already taken: {0}")]
    HandleTaken(String),
}

impl StoreFailure for StoreError {
    fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// SQLite-based implementation of `GraphStore`
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its
/// own `SqliteStore` instance.
pub struct SqliteStore {
    conn: Connection,
}

fn id_to_bytes(value: u128) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn bytes_to_id(bytes: &[u8]) -> Result<u128, StoreError> {
    if bytes.len() != 16 {
        return Err(StoreError::InvalidData(format!(
            "Expected 16 bytes for an id, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 16];
    arr.copy_from_slice(bytes);
    Ok(u128::from_be_bytes(arr))
}

fn invalid_data(e: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(e))
}

fn parse_tier(s: &str) -> Result<Tier, StoreError> {
    Tier::parse(s).ok_or_else(|| StoreError::InvalidData(format!("Unknown tier: {}", s)))
}

fn parse_kind(s: &str) -> Result<ContactKind, StoreError> {
    ContactKind::parse(s)
        .ok_or_else(|| StoreError::InvalidData(format!("Unknown contact kind: {}", s)))
}

fn parse_status(s: &str) -> Result<LinkStatus, StoreError> {
    LinkStatus::parse(s).ok_or_else(|| StoreError::InvalidData(format!("Unknown link status: {}", s)))
}

impl SqliteStore {
    /// Create a new store with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// The version the store currently holds for a graph (0 if never
    /// committed)
    pub fn graph_version(&self, owner: UserId) -> Result<u64, StoreError> {
        let version: Option<i64> = self
            .conn
            .query_row(
                "SELECT version FROM graph_versions WHERE owner_id = ?1",
                params![id_to_bytes(owner.value())],
                |row| row.get(0),
            )
            .optional()?;
        Ok(version.unwrap_or(0) as u64)
    }

    /// Replace a graph's records and reserved groups if `expected_version`
    /// still matches, bumping the version in the same transaction
    ///
    /// A mismatch rolls everything back and returns
    /// [`StoreError::Conflict`]; nothing is partially applied.
    pub fn commit_graph(
        &mut self,
        owner: UserId,
        expected_version: u64,
        records: &[RelationshipRecord],
        groups: &[ReservedGroup],
    ) -> Result<u64, StoreError> {
        let tx = self.conn.transaction()?;
        let new_version = replace_graph(&tx, owner, expected_version, records, groups)?;
        tx.commit()?;
        Ok(new_version)
    }

    /// Commit a graph and upsert a link inside the same transaction
    ///
    /// Link acceptance materializes a record in the requester's graph and
    /// flips the link to accepted; the two writes must land together. A
    /// version conflict rolls back both, so the store never holds an
    /// accepted link naming a record that was not persisted.
    pub fn commit_graph_with_link(
        &mut self,
        owner: UserId,
        expected_version: u64,
        records: &[RelationshipRecord],
        groups: &[ReservedGroup],
        link: &ConnectionLink,
    ) -> Result<u64, StoreError> {
        let tx = self.conn.transaction()?;
        let new_version = replace_graph(&tx, owner, expected_version, records, groups)?;
        insert_link(&tx, link)?;
        tx.commit()?;
        Ok(new_version)
    }

    /// Register an account in the local identity directory
    pub fn register_profile(
        &mut self,
        user_id: UserId,
        handle: &str,
        display_name: &str,
    ) -> Result<(), StoreError> {
        let taken: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT user_id FROM profiles WHERE handle = ?1",
                params![handle],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(bytes) = taken {
            if bytes_to_id(&bytes)? != user_id.value() {
                return Err(StoreError::HandleTaken(handle.to_string()));
            }
        }

        self.conn.execute(
            "INSERT INTO profiles (user_id, handle, display_name) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
             handle = excluded.handle, display_name = excluded.display_name",
            params![id_to_bytes(user_id.value()), handle, display_name],
        )?;
        Ok(())
    }

    /// Attach a verified platform contact value to an account, so the
    /// account can be resolved by it
    ///
    /// Each directory entry carries its own contact-method id; resolving
    /// by contact value reports that id back so a link records which
    /// identity actually matched. Re-registering a value keeps its id.
    pub fn register_profile_contact(
        &mut self,
        user_id: UserId,
        kind: ContactKind,
        value: &str,
    ) -> Result<ContactMethodId, StoreError> {
        let method_id = ContactMethodId::new();
        self.conn.execute(
            "INSERT INTO profile_contacts (id, user_id, kind, value) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, value) DO UPDATE SET user_id = excluded.user_id",
            params![
                id_to_bytes(method_id.value()),
                id_to_bytes(user_id.value()),
                kind.as_str(),
                value
            ],
        )?;

        let stored: Vec<u8> = self.conn.query_row(
            "SELECT id FROM profile_contacts WHERE kind = ?1 AND value = ?2",
            params![kind.as_str(), value],
            |row| row.get(0),
        )?;
        Ok(ContactMethodId::from_value(bytes_to_id(&stored)?))
    }

    /// The registered handle for an account, if it has a profile
    pub fn profile_handle(&self, user_id: UserId) -> Result<Option<String>, StoreError> {
        let handle: Option<String> = self
            .conn
            .query_row(
                "SELECT handle FROM profiles WHERE user_id = ?1",
                params![id_to_bytes(user_id.value())],
                |row| row.get(0),
            )
            .optional()?;
        Ok(handle)
    }

    fn load_contact_methods(&self, record_id: RecordId) -> Result<Vec<ContactMethod>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, value, preferred, verified FROM contact_methods
             WHERE record_id = ?1 ORDER BY id",
        )?;

        let methods = stmt
            .query_map(params![id_to_bytes(record_id.value())], |row| {
                let id_bytes: Vec<u8> = row.get(0)?;
                let kind_str: String = row.get(1)?;
                let id = bytes_to_id(&id_bytes).map_err(invalid_data)?;
                let kind = parse_kind(&kind_str).map_err(invalid_data)?;

                Ok(ContactMethod {
                    id: ContactMethodId::from_value(id),
                    kind,
                    value: row.get(2)?,
                    preferred: row.get::<_, i64>(3)? != 0,
                    verified: row.get::<_, i64>(4)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(methods)
    }

    fn row_to_record(&self, row: &rusqlite::Row<'_>) -> rusqlite::Result<RelationshipRecord> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let tier_str: String = row.get(2)?;
        let id = bytes_to_id(&id_bytes).map_err(invalid_data)?;
        let tier = parse_tier(&tier_str).map_err(invalid_data)?;

        Ok(RelationshipRecord {
            id: RecordId::from_value(id),
            display_name: row.get(1)?,
            tier,
            position: row.get::<_, i64>(3)? as u32,
            contact_methods: Vec::new(), // filled in by the caller
            created_at: row.get::<_, i64>(4)? as u64,
            ranking_reason: row.get(5)?,
        })
    }

    fn attach_contact_methods(
        &self,
        mut records: Vec<RelationshipRecord>,
    ) -> Result<Vec<RelationshipRecord>, StoreError> {
        for record in records.iter_mut() {
            record.contact_methods = self.load_contact_methods(record.id)?;
        }
        Ok(records)
    }
}

const RECORD_COLUMNS: &str = "id, display_name, tier, position, created_at, ranking_reason";

fn insert_record(
    conn: &Connection,
    owner_bytes: &[u8],
    record: &RelationshipRecord,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO records
         (id, owner_id, display_name, tier, position, created_at, ranking_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id_to_bytes(record.id.value()),
            owner_bytes,
            &record.display_name,
            record.tier.as_str(),
            record.position as i64,
            record.created_at as i64,
            &record.ranking_reason,
        ],
    )?;

    conn.execute(
        "DELETE FROM contact_methods WHERE record_id = ?1",
        params![id_to_bytes(record.id.value())],
    )?;
    for method in &record.contact_methods {
        conn.execute(
            "INSERT INTO contact_methods (id, record_id, kind, value, preferred, verified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id_to_bytes(method.id.value()),
                id_to_bytes(record.id.value()),
                method.kind.as_str(),
                &method.value,
                method.preferred as i64,
                method.verified as i64,
            ],
        )?;
    }
    Ok(())
}

fn insert_group(
    conn: &Connection,
    owner_bytes: &[u8],
    group: &ReservedGroup,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO reserved_groups (id, owner_id, tier, slot_count, note)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            id_to_bytes(group.id.value()),
            owner_bytes,
            group.tier.as_str(),
            group.count as i64,
            &group.note,
        ],
    )?;
    Ok(())
}

fn replace_graph(
    conn: &Connection,
    owner: UserId,
    expected_version: u64,
    records: &[RelationshipRecord],
    groups: &[ReservedGroup],
) -> Result<u64, StoreError> {
    let owner_bytes = id_to_bytes(owner.value());

    let actual: u64 = conn
        .query_row(
            "SELECT version FROM graph_versions WHERE owner_id = ?1",
            params![&owner_bytes],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0) as u64;
    if actual != expected_version {
        return Err(StoreError::Conflict {
            expected: expected_version,
            actual,
        });
    }

    conn.execute(
        "DELETE FROM contact_methods WHERE record_id IN
         (SELECT id FROM records WHERE owner_id = ?1)",
        params![&owner_bytes],
    )?;
    conn.execute("DELETE FROM records WHERE owner_id = ?1", params![&owner_bytes])?;
    conn.execute(
        "DELETE FROM reserved_groups WHERE owner_id = ?1",
        params![&owner_bytes],
    )?;

    for record in records {
        insert_record(conn, &owner_bytes, record)?;
    }
    for group in groups {
        insert_group(conn, &owner_bytes, group)?;
    }

    let new_version = expected_version + 1;
    conn.execute(
        "INSERT INTO graph_versions (owner_id, version) VALUES (?1, ?2)
         ON CONFLICT(owner_id) DO UPDATE SET version = excluded.version",
        params![&owner_bytes, new_version as i64],
    )?;

    Ok(new_version)
}

fn insert_link(conn: &Connection, link: &ConnectionLink) -> Result<(), StoreError> {
    conn.execute(
        "INSERT OR REPLACE INTO links
         (id, requester_id, target_id, target_display_name, proposed_tier,
          linked_record_id, matched_contact_method_id, disclose_circle,
          status, created_at, resolved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id_to_bytes(link.id.value()),
            id_to_bytes(link.requester.value()),
            id_to_bytes(link.target.value()),
            &link.target_display_name,
            link.proposed_tier.as_str(),
            link.linked_record.map(|r| id_to_bytes(r.value())),
            link.matched_contact_method.map(|m| id_to_bytes(m.value())),
            link.disclose_circle as i64,
            link.status.as_str(),
            link.created_at as i64,
            link.resolved_at.map(|t| t as i64),
        ],
    )?;
    Ok(())
}

impl GraphStore for SqliteStore {
    type Error = StoreError;

    fn put_record(&mut self, owner: UserId, record: &RelationshipRecord) -> Result<(), StoreError> {
        insert_record(&self.conn, &id_to_bytes(owner.value()), record)
    }

    fn get_record(
        &self,
        owner: UserId,
        id: RecordId,
    ) -> Result<Option<RelationshipRecord>, StoreError> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM records WHERE id = ?1 AND owner_id = ?2",
                    RECORD_COLUMNS
                ),
                params![id_to_bytes(id.value()), id_to_bytes(owner.value())],
                |row| self.row_to_record(row),
            )
            .optional()?;

        match record {
            Some(mut r) => {
                r.contact_methods = self.load_contact_methods(r.id)?;
                Ok(Some(r))
            }
            None => Ok(None),
        }
    }

    fn delete_record(&mut self, owner: UserId, id: RecordId) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM contact_methods WHERE record_id = ?1",
            params![id_to_bytes(id.value())],
        )?;
        self.conn.execute(
            "DELETE FROM records WHERE id = ?1 AND owner_id = ?2",
            params![id_to_bytes(id.value()), id_to_bytes(owner.value())],
        )?;
        Ok(())
    }

    fn records_for_tier(
        &self,
        owner: UserId,
        tier: Tier,
    ) -> Result<Vec<RelationshipRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM records WHERE owner_id = ?1 AND tier = ?2 ORDER BY position",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map(
                params![id_to_bytes(owner.value()), tier.as_str()],
                |row| self.row_to_record(row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        self.attach_contact_methods(records)
    }

    fn all_records(&self, owner: UserId) -> Result<Vec<RelationshipRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM records WHERE owner_id = ?1 ORDER BY tier, position",
            RECORD_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![id_to_bytes(owner.value())], |row| {
                self.row_to_record(row)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        self.attach_contact_methods(records)
    }

    fn put_group(&mut self, owner: UserId, group: &ReservedGroup) -> Result<(), StoreError> {
        insert_group(&self.conn, &id_to_bytes(owner.value()), group)
    }

    fn delete_group(&mut self, owner: UserId, id: GroupId) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM reserved_groups WHERE id = ?1 AND owner_id = ?2",
            params![id_to_bytes(id.value()), id_to_bytes(owner.value())],
        )?;
        Ok(())
    }

    fn all_groups(&self, owner: UserId) -> Result<Vec<ReservedGroup>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, tier, slot_count, note FROM reserved_groups WHERE owner_id = ?1",
        )?;
        let groups = stmt
            .query_map(params![id_to_bytes(owner.value())], |row| {
                let id_bytes: Vec<u8> = row.get(0)?;
                let tier_str: String = row.get(1)?;
                let id = bytes_to_id(&id_bytes).map_err(invalid_data)?;
                let tier = parse_tier(&tier_str).map_err(invalid_data)?;

                Ok(ReservedGroup {
                    id: GroupId::from_value(id),
                    tier,
                    count: row.get::<_, i64>(2)? as u32,
                    note: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(groups)
    }

    fn put_link(&mut self, link: &ConnectionLink) -> Result<(), StoreError> {
        insert_link(&self.conn, link)
    }

    fn get_link(&self, id: LinkId) -> Result<Option<ConnectionLink>, StoreError> {
        let link = self
            .conn
            .query_row(
                "SELECT id, requester_id, target_id, target_display_name, proposed_tier,
                        linked_record_id, matched_contact_method_id, disclose_circle,
                        status, created_at, resolved_at
                 FROM links WHERE id = ?1",
                params![id_to_bytes(id.value())],
                row_to_link,
            )
            .optional()?;
        Ok(link)
    }

    fn delete_link(&mut self, id: LinkId) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM links WHERE id = ?1", params![id_to_bytes(id.value())])?;
        Ok(())
    }

    fn links_for_user(&self, user: UserId) -> Result<Vec<ConnectionLink>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, requester_id, target_id, target_display_name, proposed_tier,
                    linked_record_id, matched_contact_method_id, disclose_circle,
                    status, created_at, resolved_at
             FROM links WHERE requester_id = ?1 OR target_id = ?1",
        )?;
        let links = stmt
            .query_map(params![id_to_bytes(user.value())], row_to_link)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }
}

fn row_to_link(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConnectionLink> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let requester_bytes: Vec<u8> = row.get(1)?;
    let target_bytes: Vec<u8> = row.get(2)?;
    let tier_str: String = row.get(4)?;
    let linked_bytes: Option<Vec<u8>> = row.get(5)?;
    let matched_bytes: Option<Vec<u8>> = row.get(6)?;
    let status_str: String = row.get(8)?;

    let id = bytes_to_id(&id_bytes).map_err(invalid_data)?;
    let requester = bytes_to_id(&requester_bytes).map_err(invalid_data)?;
    let target = bytes_to_id(&target_bytes).map_err(invalid_data)?;
    let tier = parse_tier(&tier_str).map_err(invalid_data)?;
    let status = parse_status(&status_str).map_err(invalid_data)?;

    let linked_record = match linked_bytes {
        Some(bytes) => Some(RecordId::from_value(bytes_to_id(&bytes).map_err(invalid_data)?)),
        None => None,
    };
    let matched_contact_method = match matched_bytes {
        Some(bytes) => Some(ContactMethodId::from_value(
            bytes_to_id(&bytes).map_err(invalid_data)?,
        )),
        None => None,
    };

    let resolved_at: Option<i64> = row.get(10)?;

    Ok(ConnectionLink {
        id: LinkId::from_value(id),
        requester: UserId::from_value(requester),
        target: UserId::from_value(target),
        target_display_name: row.get(3)?,
        proposed_tier: tier,
        linked_record,
        matched_contact_method,
        disclose_circle: row.get::<_, i64>(7)? != 0,
        status,
        created_at: row.get::<_, i64>(9)? as u64,
        resolved_at: resolved_at.map(|t| t as u64),
    })
}

impl IdentityResolver for SqliteStore {
    type Error = StoreError;

    fn resolve(&self, identifier: &Identifier) -> Result<Option<ResolvedIdentity>, StoreError> {
        // Handle lookups carry no contact-method provenance; contact-value
        // lookups report the directory entry that matched.
        let hit: Option<(Vec<u8>, Option<Vec<u8>>)> = match identifier {
            Identifier::Handle(handle) => self
                .conn
                .query_row(
                    "SELECT user_id FROM profiles WHERE handle = ?1",
                    params![handle],
                    |row| Ok((row.get(0)?, None)),
                )
                .optional()?,
            Identifier::ContactValue(kind, value) => self
                .conn
                .query_row(
                    "SELECT user_id, id FROM profile_contacts WHERE kind = ?1 AND value = ?2",
                    params![kind.as_str(), value],
                    |row| Ok((row.get(0)?, Some(row.get(1)?))),
                )
                .optional()?,
        };

        let Some((user_bytes, method_bytes)) = hit else {
            return Ok(None);
        };
        let user_id = UserId::from_value(bytes_to_id(&user_bytes)?);
        let matched_contact_method = match method_bytes {
            Some(bytes) => Some(ContactMethodId::from_value(bytes_to_id(&bytes)?)),
            None => None,
        };

        let display_name: String = self.conn.query_row(
            "SELECT display_name FROM profiles WHERE user_id = ?1",
            params![id_to_bytes(user_id.value())],
            |row| row.get(0),
        )?;

        Ok(Some(ResolvedIdentity {
            user_id,
            display_name,
            matched_contact_method,
        }))
    }
}
