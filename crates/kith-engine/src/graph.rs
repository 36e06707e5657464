//! The authoritative in-memory state for one user's relationship graph
//!
//! [`CircleGraph`] owns the records and reserved groups and enforces the
//! capacity, ordering, and movement invariants on every mutation. Each
//! public operation validates completely before touching state, so a
//! rejected operation leaves the graph byte-for-byte unchanged.

use crate::error::{EngineError, Result};
use crate::movement::{self, MoveCheck, MovementOption};
use kith_domain::{
    ContactMethod, GroupId, RecordId, RelationshipRecord, ReservedGroup, Tier, TierCapacity,
    UserId,
};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Input data for creating a relationship record
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    /// Display name for the new record
    pub display_name: String,

    /// Initial contact methods, if any
    pub contact_methods: Vec<ContactMethod>,

    /// Ranking reason, meaningful only in ranked tiers
    pub ranking_reason: Option<String>,
}

impl RecordDraft {
    /// Create a draft with just a display name
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Self::default()
        }
    }
}

/// In-place field update for a record
///
/// `None` fields are left untouched. Tier and position are never part of
/// a patch; those change only through `move_record` and `reorder`.
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    /// Replace the display name
    pub display_name: Option<String>,

    /// Replace the contact-method list
    pub contact_methods: Option<Vec<ContactMethod>>,

    /// Replace the ranking reason; `Some(None)` clears it
    pub ranking_reason: Option<Option<String>>,
}

/// One user's relationship graph: records plus reserved groups
#[derive(Debug, Clone, PartialEq)]
pub struct CircleGraph {
    owner: UserId,
    records: Vec<RelationshipRecord>,
    groups: Vec<ReservedGroup>,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl CircleGraph {
    /// Create an empty graph for the given owner
    pub fn new(owner: UserId) -> Self {
        Self {
            owner,
            records: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Rebuild a graph from persisted state
    ///
    /// Positions are re-compacted per tier in their persisted relative
    /// order, so a store that returns gapped positions still yields a
    /// consistent graph.
    pub fn from_parts(
        owner: UserId,
        records: Vec<RelationshipRecord>,
        groups: Vec<ReservedGroup>,
    ) -> Self {
        let mut graph = Self {
            owner,
            records,
            groups,
        };
        for tier in Tier::ALL {
            graph.compact_tier(tier);
        }
        graph
    }

    /// The user who owns this graph
    pub fn owner(&self) -> UserId {
        self.owner
    }

    /// All records, unordered
    pub fn records(&self) -> &[RelationshipRecord] {
        &self.records
    }

    /// All reserved groups
    pub fn groups(&self) -> &[ReservedGroup] {
        &self.groups
    }

    /// Capacity ledger for one tier, computed over the current snapshot
    pub fn capacity(&self, tier: Tier) -> TierCapacity {
        TierCapacity::compute(tier, &self.records, &self.groups)
    }

    /// Get a record by id
    pub fn get_record(&self, id: RecordId) -> Option<&RelationshipRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Get a reserved group by id
    pub fn get_group(&self, id: GroupId) -> Option<&ReservedGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Records in one tier, in position order
    pub fn records_in_tier(&self, tier: Tier) -> Vec<&RelationshipRecord> {
        let mut members: Vec<_> = self.records.iter().filter(|r| r.tier == tier).collect();
        members.sort_by_key(|r| r.position);
        members
    }

    /// Add a named record to the end of a tier's order
    ///
    /// Fails with `CapacityExceeded` if the tier has no available slot,
    /// and with `DirectAddDisabled` for import-only tiers.
    pub fn add_record(&mut self, tier: Tier, draft: RecordDraft) -> Result<&RelationshipRecord> {
        if !tier.definition().direct_add {
            return Err(EngineError::DirectAddDisabled(tier));
        }
        self.insert_record(tier, draft)
    }

    /// Add a record through the bulk-import path
    ///
    /// Bypasses only the direct-add flag; the capacity contract is the
    /// same as `add_record`, one record at a time.
    pub fn import_record(&mut self, tier: Tier, draft: RecordDraft) -> Result<&RelationshipRecord> {
        self.insert_record(tier, draft)
    }

    fn insert_record(&mut self, tier: Tier, draft: RecordDraft) -> Result<&RelationshipRecord> {
        let capacity = self.capacity(tier);
        if !capacity.has_room_for(1) {
            return Err(EngineError::CapacityExceeded {
                tier,
                requested: 1,
                available: capacity.available,
            });
        }

        let position = capacity.used;
        let mut record = RelationshipRecord::new(draft.display_name, tier, position, now_millis());
        record.contact_methods = draft.contact_methods;
        if tier.definition().ranked {
            record.ranking_reason = draft.ranking_reason;
        }

        self.records.push(record);
        Ok(self.records.last().unwrap())
    }

    /// Delete a record and compact the remaining positions in its tier
    pub fn remove_record(&mut self, id: RecordId) -> Result<RelationshipRecord> {
        let index = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("record {}", id)))?;

        let removed = self.records.remove(index);
        self.compact_tier(removed.tier);
        Ok(removed)
    }

    /// Move a record to another tier
    ///
    /// Succeeds only if the destination is on the current tier's
    /// allow-list and has an available slot; on success the record is
    /// appended at the end of the destination order and the source order
    /// is compacted.
    pub fn move_record(&mut self, id: RecordId, destination: Tier) -> Result<&RelationshipRecord> {
        let current = self
            .get_record(id)
            .ok_or_else(|| EngineError::NotFound(format!("record {}", id)))?
            .tier;

        let dest_capacity = self.capacity(destination);
        match movement::check_move(current, destination, &dest_capacity) {
            MoveCheck::NotAnAllowedEdge => {
                return Err(EngineError::NotAnAllowedEdge {
                    from: current,
                    to: destination,
                })
            }
            MoveCheck::DestinationFull => {
                return Err(EngineError::CapacityExceeded {
                    tier: destination,
                    requested: 1,
                    available: dest_capacity.available,
                })
            }
            MoveCheck::Allowed => {}
        }

        let new_position = dest_capacity.used;
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .expect("record existence checked above");
        record.tier = destination;
        record.position = new_position;
        if !destination.definition().ranked {
            record.ranking_reason = None;
        }

        self.compact_tier(current);
        Ok(self.get_record(id).expect("record still present after move"))
    }

    /// Replace the position assignment for a tier
    ///
    /// Fails with `InvalidReorder` unless `ordered_ids` is exactly the
    /// current membership of the tier: nothing dropped, duplicated, or
    /// invented.
    pub fn reorder(&mut self, tier: Tier, ordered_ids: &[RecordId]) -> Result<()> {
        let current: HashSet<RecordId> = self
            .records
            .iter()
            .filter(|r| r.tier == tier)
            .map(|r| r.id)
            .collect();

        let supplied: HashSet<RecordId> = ordered_ids.iter().copied().collect();
        if supplied.len() != ordered_ids.len() {
            return Err(EngineError::InvalidReorder(
                "duplicate record id in supplied order".to_string(),
            ));
        }
        if supplied != current {
            return Err(EngineError::InvalidReorder(format!(
                "supplied order names {} records but the '{}' tier holds {}; \
                 the id sets must match exactly",
                ordered_ids.len(),
                tier,
                current.len()
            )));
        }

        for record in self.records.iter_mut() {
            if record.tier == tier {
                let position = ordered_ids
                    .iter()
                    .position(|id| *id == record.id)
                    .expect("id set equality checked above");
                record.position = position as u32;
            }
        }
        Ok(())
    }

    /// Update record fields in place; never touches tier or position
    pub fn update_record(&mut self, id: RecordId, patch: RecordPatch) -> Result<&RelationshipRecord> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("record {}", id)))?;

        if let Some(name) = patch.display_name {
            record.display_name = name;
        }
        if let Some(methods) = patch.contact_methods {
            record.contact_methods = methods;
        }
        if let Some(reason) = patch.ranking_reason {
            record.ranking_reason = reason;
        }
        Ok(&*record)
    }

    /// Legal destinations for a record, with current viability and
    /// promote/demote affordances
    pub fn movement_options(&self, id: RecordId) -> Result<Vec<MovementOption>> {
        let current = self
            .get_record(id)
            .ok_or_else(|| EngineError::NotFound(format!("record {}", id)))?
            .tier;

        Ok(current
            .allowed_destinations()
            .iter()
            .map(|&dest| MovementOption {
                tier: dest,
                check: movement::check_move(current, dest, &self.capacity(dest)),
                direction: movement::direction_of(current, dest),
            })
            .collect())
    }

    /// Create an anonymous reserved group holding `count` slots
    pub fn create_group(
        &mut self,
        tier: Tier,
        count: u32,
        note: Option<String>,
    ) -> Result<&ReservedGroup> {
        if count == 0 {
            return Err(EngineError::InvalidInput(
                "reserved group count must be positive".to_string(),
            ));
        }
        let capacity = self.capacity(tier);
        if !capacity.has_room_for(count) {
            return Err(EngineError::CapacityExceeded {
                tier,
                requested: count,
                available: capacity.available,
            });
        }

        self.groups.push(ReservedGroup::new(tier, count, note));
        Ok(self.groups.last().unwrap())
    }

    /// Resize a reserved group
    ///
    /// Capacity is recomputed excluding the group being resized, so
    /// resizing to the current count is always a no-op and never fails.
    /// A new count of zero deletes the group.
    pub fn resize_group(&mut self, id: GroupId, new_count: u32) -> Result<()> {
        let group = self
            .groups
            .iter()
            .find(|g| g.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("reserved group {}", id)))?;
        let tier = group.tier;
        let old_count = group.count;

        if new_count == 0 {
            return self.delete_group(id);
        }

        let capacity = self.capacity(tier);
        let available_excluding_self = capacity.available + old_count;
        if new_count > available_excluding_self {
            return Err(EngineError::CapacityExceeded {
                tier,
                requested: new_count,
                available: available_excluding_self,
            });
        }

        let group = self
            .groups
            .iter_mut()
            .find(|g| g.id == id)
            .expect("group existence checked above");
        group.count = new_count;
        Ok(())
    }

    /// Delete a reserved group unconditionally, freeing capacity
    pub fn delete_group(&mut self, id: GroupId) -> Result<()> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("reserved group {}", id)))?;
        self.groups.remove(index);
        Ok(())
    }

    /// Records in the given tiers that carry at least one contact method,
    /// most intimate tier first
    ///
    /// Read-only view for the emergency/SOS collaborator; it never
    /// mutates through this core.
    pub fn contactable_records(&self, tiers: &[Tier]) -> Vec<&RelationshipRecord> {
        let mut tiers: Vec<Tier> = tiers.to_vec();
        tiers.sort_by_key(|t| t.rank());

        tiers
            .iter()
            .flat_map(|&tier| self.records_in_tier(tier))
            .filter(|r| !r.contact_methods.is_empty())
            .collect()
    }

    /// Renumber a tier's positions to a dense 0..n-1 range, preserving
    /// the existing relative order
    fn compact_tier(&mut self, tier: Tier) {
        let mut member_indices: Vec<usize> = self
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.tier == tier)
            .map(|(i, _)| i)
            .collect();
        member_indices.sort_by_key(|&i| self.records[i].position);

        for (position, index) in member_indices.into_iter().enumerate() {
            self.records[index].position = position as u32;
        }
    }

    /// Debug-only invariant check used by tests
    #[doc(hidden)]
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for tier in Tier::ALL {
            let cap = self.capacity(tier);
            if cap.used + cap.reserved > cap.limit {
                return Err(format!(
                    "capacity violated in '{}': {} used + {} reserved > {} limit",
                    tier, cap.used, cap.reserved, cap.limit
                ));
            }

            let mut positions: Vec<u32> = self
                .records
                .iter()
                .filter(|r| r.tier == tier)
                .map(|r| r.position)
                .collect();
            positions.sort_unstable();
            for (expected, actual) in positions.iter().enumerate() {
                if *actual != expected as u32 {
                    return Err(format!(
                        "positions in '{}' are not dense: {:?}",
                        tier, positions
                    ));
                }
            }
        }

        for group in &self.groups {
            if group.count == 0 {
                return Err(format!("zero-count reserved group {}", group.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MoveDirection;

    fn graph() -> CircleGraph {
        CircleGraph::new(UserId::new())
    }

    fn fill_tier(g: &mut CircleGraph, tier: Tier, count: u32) -> Vec<RecordId> {
        (0..count)
            .map(|i| {
                g.add_record(tier, RecordDraft::named(format!("p{}", i)))
                    .unwrap()
                    .id
            })
            .collect()
    }

    #[test]
    fn test_add_appends_at_end() {
        let mut g = graph();
        let ids = fill_tier(&mut g, Tier::Core, 3);

        let members = g.records_in_tier(Tier::Core);
        assert_eq!(members.len(), 3);
        for (i, member) in members.iter().enumerate() {
            assert_eq!(member.position, i as u32);
            assert_eq!(member.id, ids[i]);
        }
    }

    #[test]
    fn test_add_respects_reserved_capacity() {
        // Limit 5: 4 named + 1 reserved leaves no room
        let mut g = graph();
        let ids = fill_tier(&mut g, Tier::Core, 4);
        g.create_group(Tier::Core, 1, None).unwrap();

        let err = g.add_record(Tier::Core, RecordDraft::named("Eve")).unwrap_err();
        assert!(matches!(err, EngineError::CapacityExceeded { tier: Tier::Core, .. }));

        // Freeing one named slot makes the same call succeed
        g.remove_record(ids[0]).unwrap();
        assert!(g.add_record(Tier::Core, RecordDraft::named("Eve")).is_ok());
    }

    #[test]
    fn test_direct_add_disabled_for_import_tier() {
        let mut g = graph();
        let err = g
            .add_record(Tier::Acquainted, RecordDraft::named("Imp"))
            .unwrap_err();
        assert_eq!(err, EngineError::DirectAddDisabled(Tier::Acquainted));

        // The import path accepts the same draft
        assert!(g
            .import_record(Tier::Acquainted, RecordDraft::named("Imp"))
            .is_ok());
    }

    #[test]
    fn test_remove_compacts_positions() {
        let mut g = graph();
        let ids = fill_tier(&mut g, Tier::Sympathy, 4);
        g.remove_record(ids[1]).unwrap();

        let members = g.records_in_tier(Tier::Sympathy);
        assert_eq!(members.len(), 3);
        assert_eq!(
            members.iter().map(|r| r.position).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        // Relative order of the survivors is preserved
        assert_eq!(members[0].id, ids[0]);
        assert_eq!(members[1].id, ids[2]);
        assert_eq!(members[2].id, ids[3]);
    }

    #[test]
    fn test_move_illegal_edge_leaves_state_unchanged() {
        let mut g = graph();
        let ids = fill_tier(&mut g, Tier::Core, 2);
        let before = g.clone();

        // Core -> Network is not on the allow-list
        let err = g.move_record(ids[0], Tier::Network).unwrap_err();
        assert_eq!(
            err,
            EngineError::NotAnAllowedEdge {
                from: Tier::Core,
                to: Tier::Network
            }
        );
        assert_eq!(g, before);
    }

    #[test]
    fn test_move_full_destination_leaves_state_unchanged() {
        let mut g = graph();
        fill_tier(&mut g, Tier::Core, 5);
        let ids = fill_tier(&mut g, Tier::Sympathy, 1);
        let before = g.clone();

        let err = g.move_record(ids[0], Tier::Core).unwrap_err();
        assert!(matches!(err, EngineError::CapacityExceeded { tier: Tier::Core, .. }));
        assert_eq!(g, before);
    }

    #[test]
    fn test_move_appends_to_destination_and_compacts_source() {
        let mut g = graph();
        let core = fill_tier(&mut g, Tier::Core, 3);
        fill_tier(&mut g, Tier::Sympathy, 2);

        let moved = g.move_record(core[0], Tier::Sympathy).unwrap();
        assert_eq!(moved.tier, Tier::Sympathy);
        assert_eq!(moved.position, 2);

        let source = g.records_in_tier(Tier::Core);
        assert_eq!(source.len(), 2);
        assert_eq!(source[0].id, core[1]);
        assert_eq!(source[0].position, 0);
        assert_eq!(source[1].position, 1);
    }

    #[test]
    fn test_reorder_replaces_positions() {
        // Reorder [r2, r1, r3] over {r1, r2, r3}
        let mut g = graph();
        let ids = fill_tier(&mut g, Tier::Core, 3);
        g.reorder(Tier::Core, &[ids[1], ids[0], ids[2]]).unwrap();

        assert_eq!(g.get_record(ids[1]).unwrap().position, 0);
        assert_eq!(g.get_record(ids[0]).unwrap().position, 1);
        assert_eq!(g.get_record(ids[2]).unwrap().position, 2);
    }

    #[test]
    fn test_reorder_rejects_mismatched_sets() {
        let mut g = graph();
        let ids = fill_tier(&mut g, Tier::Core, 3);

        // Dropped a record
        let err = g.reorder(Tier::Core, &[ids[0], ids[1]]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidReorder(_)));

        // Duplicated a record
        let err = g.reorder(Tier::Core, &[ids[0], ids[1], ids[1]]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidReorder(_)));

        // Invented a record
        let err = g
            .reorder(Tier::Core, &[ids[0], ids[1], RecordId::new()])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidReorder(_)));

        // Positions unchanged throughout
        assert_eq!(g.get_record(ids[0]).unwrap().position, 0);
    }

    #[test]
    fn test_update_never_touches_tier_or_position() {
        let mut g = graph();
        let ids = fill_tier(&mut g, Tier::Core, 2);

        let updated = g
            .update_record(
                ids[1],
                RecordPatch {
                    display_name: Some("Renamed".to_string()),
                    ..RecordPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.display_name, "Renamed");
        assert_eq!(updated.tier, Tier::Core);
        assert_eq!(updated.position, 1);
    }

    #[test]
    fn test_resize_to_same_count_is_noop_in_full_tier() {
        // Fully packed tier: resize 2 -> 2 succeeds, 2 -> 3 fails
        let mut g = graph();
        fill_tier(&mut g, Tier::Core, 3);
        let group_id = g.create_group(Tier::Core, 2, None).unwrap().id;
        assert_eq!(g.capacity(Tier::Core).available, 0);

        g.resize_group(group_id, 2).unwrap();
        assert_eq!(g.get_group(group_id).unwrap().count, 2);

        let err = g.resize_group(group_id, 3).unwrap_err();
        assert!(matches!(err, EngineError::CapacityExceeded { tier: Tier::Core, .. }));
    }

    #[test]
    fn test_resize_to_zero_deletes_group() {
        let mut g = graph();
        let group_id = g.create_group(Tier::Close, 3, None).unwrap().id;
        g.resize_group(group_id, 0).unwrap();
        assert!(g.get_group(group_id).is_none());
    }

    #[test]
    fn test_delete_group_frees_capacity_immediately() {
        let mut g = graph();
        fill_tier(&mut g, Tier::Core, 4);
        let group_id = g.create_group(Tier::Core, 1, None).unwrap().id;
        assert_eq!(g.capacity(Tier::Core).available, 0);

        g.delete_group(group_id).unwrap();
        assert_eq!(g.capacity(Tier::Core).available, 1);
    }

    #[test]
    fn test_movement_options_partition() {
        let mut g = graph();
        fill_tier(&mut g, Tier::Core, 5);
        let ids = fill_tier(&mut g, Tier::Sympathy, 1);

        let options = g.movement_options(ids[0]).unwrap();
        assert_eq!(options.len(), 2);

        let core = options.iter().find(|o| o.tier == Tier::Core).unwrap();
        assert_eq!(core.check, MoveCheck::DestinationFull);
        assert_eq!(core.direction, MoveDirection::Promote);

        let close = options.iter().find(|o| o.tier == Tier::Close).unwrap();
        assert_eq!(close.check, MoveCheck::Allowed);
        assert_eq!(close.direction, MoveDirection::Demote);
    }

    #[test]
    fn test_ranking_reason_dropped_on_unranked_tier() {
        let mut g = graph();
        let draft = RecordDraft {
            display_name: "Mentor".to_string(),
            contact_methods: Vec::new(),
            ranking_reason: Some("lifelong example".to_string()),
        };
        let id = g.add_record(Tier::RoleModel, draft).unwrap().id;
        assert!(g.get_record(id).unwrap().ranking_reason.is_some());

        // The same reason on an unranked tier is discarded
        let draft = RecordDraft {
            display_name: "Friend".to_string(),
            contact_methods: Vec::new(),
            ranking_reason: Some("ignored".to_string()),
        };
        let id = g.add_record(Tier::Core, draft).unwrap().id;
        assert!(g.get_record(id).unwrap().ranking_reason.is_none());
    }

    #[test]
    fn test_contactable_records_ordered_by_intimacy() {
        let mut g = graph();
        let mut draft = RecordDraft::named("Net");
        draft
            .contact_methods
            .push(ContactMethod::new(kith_domain::ContactKind::Phone, "+1"));
        g.add_record(Tier::Network, draft).unwrap();

        let mut draft = RecordDraft::named("Core");
        draft
            .contact_methods
            .push(ContactMethod::new(kith_domain::ContactKind::Phone, "+2"));
        g.add_record(Tier::Core, draft).unwrap();

        g.add_record(Tier::Core, RecordDraft::named("NoContact"))
            .unwrap();

        let reachable = g.contactable_records(&[Tier::Network, Tier::Core]);
        assert_eq!(reachable.len(), 2);
        assert_eq!(reachable[0].display_name, "Core");
        assert_eq!(reachable[1].display_name, "Net");
    }
}
