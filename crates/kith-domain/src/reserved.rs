//! Reserved group module - anonymous capacity held against a tier

use crate::ids::GroupId;
use crate::tier::Tier;

/// Anonymous capacity consumed without a named record
///
/// A reserved group counts against its tier's limit exactly like named
/// members do: `used + reserved <= limit` must hold at all times. The
/// note is private to the graph owner and never crosses a link boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservedGroup {
    /// Unique identifier
    pub id: GroupId,

    /// The tier whose capacity this group holds
    pub tier: Tier,

    /// Number of slots held (always positive; zero-count groups are
    /// deleted, never stored)
    pub count: u32,

    /// Private note, e.g. "saving these for family"
    pub note: Option<String>,
}

impl ReservedGroup {
    /// Create a new reserved group
    pub fn new(tier: Tier, count: u32, note: Option<String>) -> Self {
        Self {
            id: GroupId::new(),
            tier,
            count,
            note,
        }
    }
}
