//! Capacity ledger - pure used/reserved/available accounting for a tier
//!
//! Every mutating engine operation consults this before touching state,
//! and the same computation backs read-only capacity displays, so it is
//! deliberately side-effect-free.

use crate::record::RelationshipRecord;
use crate::reserved::ReservedGroup;
use crate::tier::Tier;

/// Computed capacity accounting for one tier
///
/// Invariant in a consistent store: `used + reserved <= limit`, so
/// `available` is never negative. Operations that would drive it negative
/// must be rejected before any mutation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierCapacity {
    /// The tier this accounting describes
    pub tier: Tier,

    /// Named members currently in the tier
    pub used: u32,

    /// Slots held by anonymous reserved groups
    pub reserved: u32,

    /// The tier's fixed capacity limit
    pub limit: u32,

    /// Remaining slots: `limit - used - reserved`
    pub available: u32,
}

impl TierCapacity {
    /// Compute the capacity ledger for `tier` over a snapshot of records
    /// and reserved groups
    ///
    /// Records and groups belonging to other tiers are ignored, so callers
    /// may pass the whole graph's collections unfiltered.
    pub fn compute(
        tier: Tier,
        records: &[RelationshipRecord],
        groups: &[ReservedGroup],
    ) -> Self {
        let used = records.iter().filter(|r| r.tier == tier).count() as u32;
        let reserved = groups
            .iter()
            .filter(|g| g.tier == tier)
            .map(|g| g.count)
            .sum::<u32>();
        let limit = tier.capacity_limit();

        Self {
            tier,
            used,
            reserved,
            limit,
            available: limit.saturating_sub(used + reserved),
        }
    }

    /// Whether at least `slots` more slots can be occupied
    pub fn has_room_for(&self, slots: u32) -> bool {
        self.available >= slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tier: Tier, position: u32) -> RelationshipRecord {
        RelationshipRecord::new(format!("p{}", position), tier, position, 0)
    }

    #[test]
    fn test_empty_tier() {
        let cap = TierCapacity::compute(Tier::Core, &[], &[]);
        assert_eq!(cap.used, 0);
        assert_eq!(cap.reserved, 0);
        assert_eq!(cap.limit, 5);
        assert_eq!(cap.available, 5);
    }

    #[test]
    fn test_mixed_usage() {
        let records = vec![record(Tier::Core, 0), record(Tier::Core, 1)];
        let groups = vec![ReservedGroup::new(Tier::Core, 2, None)];

        let cap = TierCapacity::compute(Tier::Core, &records, &groups);
        assert_eq!(cap.used, 2);
        assert_eq!(cap.reserved, 2);
        assert_eq!(cap.available, 1);
        assert!(cap.has_room_for(1));
        assert!(!cap.has_room_for(2));
    }

    #[test]
    fn test_other_tiers_ignored() {
        let records = vec![record(Tier::Sympathy, 0), record(Tier::Core, 0)];
        let groups = vec![ReservedGroup::new(Tier::Close, 10, None)];

        let cap = TierCapacity::compute(Tier::Core, &records, &groups);
        assert_eq!(cap.used, 1);
        assert_eq!(cap.reserved, 0);
    }

    #[test]
    fn test_full_tier_has_no_room() {
        let records: Vec<_> = (0..5).map(|i| record(Tier::Core, i)).collect();
        let cap = TierCapacity::compute(Tier::Core, &records, &[]);
        assert_eq!(cap.available, 0);
        assert!(!cap.has_room_for(1));
        assert!(cap.has_room_for(0));
    }
}
