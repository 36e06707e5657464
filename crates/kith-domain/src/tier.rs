//! Tier module - the fixed set of capacity-bounded relationship circles
//!
//! Tiers range from the most intimate (tight numeric limit) to the least,
//! plus special-purpose tiers for ranked role models, one-directional
//! parasocial follows, and the bulk-import-only acquainted pool. Every
//! tier-specific behavior is expressed as a declarative flag on
//! [`TierDefinition`] so that calling code never branches on tier identity.

/// A relationship circle with a fixed capacity limit
///
/// Members can only move between tiers along the allow-list edges in each
/// tier's [`TierDefinition`]; arbitrary transitions are rejected regardless
/// of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// The innermost circle (support clique)
    Core,

    /// The sympathy group around the core
    Sympathy,

    /// Close friends
    Close,

    /// The wider active network
    Network,

    /// Bulk-imported contacts awaiting triage; direct adds are disabled
    Acquainted,

    /// Ranked role models (entries carry a ranking reason)
    RoleModel,

    /// One-directional follows with no reciprocity expectation
    Parasocial,
}

/// Static definition of a single tier
///
/// Immutable configuration: the engine consults these fields instead of
/// matching on tier identity.
#[derive(Debug, Clone, Copy)]
pub struct TierDefinition {
    /// The tier this definition describes
    pub id: Tier,

    /// Human-readable role of the tier
    pub role: &'static str,

    /// Maximum number of occupied slots (named members plus reserved)
    pub capacity_limit: u32,

    /// Recommended minimum membership, if the product suggests one
    pub recommended_minimum: Option<u32>,

    /// Tiers an existing member may legally move into
    pub allowed_destinations: &'static [Tier],

    /// Whether members carry an explicit ranking (role models)
    pub ranked: bool,

    /// Whether the relationship is expected to be reciprocal
    pub reciprocal: bool,

    /// Whether records may be added directly (false = import-only)
    pub direct_add: bool,
}

const CORE: TierDefinition = TierDefinition {
    id: Tier::Core,
    role: "support clique",
    capacity_limit: 5,
    recommended_minimum: Some(3),
    allowed_destinations: &[Tier::Sympathy],
    ranked: false,
    reciprocal: true,
    direct_add: true,
};

const SYMPATHY: TierDefinition = TierDefinition {
    id: Tier::Sympathy,
    role: "sympathy group",
    capacity_limit: 15,
    recommended_minimum: None,
    allowed_destinations: &[Tier::Core, Tier::Close],
    ranked: false,
    reciprocal: true,
    direct_add: true,
};

const CLOSE: TierDefinition = TierDefinition {
    id: Tier::Close,
    role: "close friends",
    capacity_limit: 50,
    recommended_minimum: None,
    allowed_destinations: &[Tier::Sympathy, Tier::Network],
    ranked: false,
    reciprocal: true,
    direct_add: true,
};

const NETWORK: TierDefinition = TierDefinition {
    id: Tier::Network,
    role: "active network",
    capacity_limit: 150,
    recommended_minimum: None,
    allowed_destinations: &[Tier::Close],
    ranked: false,
    reciprocal: true,
    direct_add: true,
};

const ACQUAINTED: TierDefinition = TierDefinition {
    id: Tier::Acquainted,
    role: "imported acquaintances",
    capacity_limit: 500,
    recommended_minimum: None,
    allowed_destinations: &[Tier::Network],
    ranked: false,
    reciprocal: true,
    direct_add: false,
};

const ROLE_MODEL: TierDefinition = TierDefinition {
    id: Tier::RoleModel,
    role: "role models",
    capacity_limit: 10,
    recommended_minimum: None,
    allowed_destinations: &[],
    ranked: true,
    reciprocal: true,
    direct_add: true,
};

const PARASOCIAL: TierDefinition = TierDefinition {
    id: Tier::Parasocial,
    role: "parasocial follows",
    capacity_limit: 100,
    recommended_minimum: None,
    allowed_destinations: &[],
    ranked: false,
    reciprocal: false,
    direct_add: true,
};

impl Tier {
    /// All tiers, most intimate first
    pub const ALL: [Tier; 7] = [
        Tier::Core,
        Tier::Sympathy,
        Tier::Close,
        Tier::Network,
        Tier::Acquainted,
        Tier::RoleModel,
        Tier::Parasocial,
    ];

    /// Get the static definition for this tier
    pub fn definition(&self) -> &'static TierDefinition {
        match self {
            Tier::Core => &CORE,
            Tier::Sympathy => &SYMPATHY,
            Tier::Close => &CLOSE,
            Tier::Network => &NETWORK,
            Tier::Acquainted => &ACQUAINTED,
            Tier::RoleModel => &ROLE_MODEL,
            Tier::Parasocial => &PARASOCIAL,
        }
    }

    /// Maximum number of occupied slots in this tier
    pub fn capacity_limit(&self) -> u32 {
        self.definition().capacity_limit
    }

    /// Tiers an existing member may legally move into
    pub fn allowed_destinations(&self) -> &'static [Tier] {
        self.definition().allowed_destinations
    }

    /// Intimacy rank, most intimate first (0 = innermost)
    ///
    /// Used only to derive "promote" vs "demote" UI affordances when
    /// comparing a tier against an allowed destination; never consulted
    /// for move validation.
    pub fn rank(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(usize::MAX)
    }

    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Core => "core",
            Tier::Sympathy => "sympathy",
            Tier::Close => "close",
            Tier::Network => "network",
            Tier::Acquainted => "acquainted",
            Tier::RoleModel => "role_model",
            Tier::Parasocial => "parasocial",
        }
    }

    /// Parse a tier from a string (internal use)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "core" => Some(Tier::Core),
            "sympathy" => Some(Tier::Sympathy),
            "close" => Some(Tier::Close),
            "network" => Some(Tier::Network),
            "acquainted" => Some(Tier::Acquainted),
            "role_model" => Some(Tier::RoleModel),
            "parasocial" => Some(Tier::Parasocial),
            _ => None,
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid tier: {}", s))
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_limits_are_positive() {
        for tier in Tier::ALL {
            assert!(tier.capacity_limit() > 0, "{} has zero capacity", tier);
        }
    }

    #[test]
    fn test_allowed_destinations_exclude_self() {
        for tier in Tier::ALL {
            assert!(
                !tier.allowed_destinations().contains(&tier),
                "{} lists itself as a destination",
                tier
            );
        }
    }

    #[test]
    fn test_movement_chain_is_adjacent() {
        assert_eq!(Tier::Core.allowed_destinations(), &[Tier::Sympathy]);
        assert_eq!(
            Tier::Sympathy.allowed_destinations(),
            &[Tier::Core, Tier::Close]
        );
        assert_eq!(Tier::Acquainted.allowed_destinations(), &[Tier::Network]);
        assert!(Tier::RoleModel.allowed_destinations().is_empty());
        assert!(Tier::Parasocial.allowed_destinations().is_empty());
    }

    #[test]
    fn test_rank_ordering() {
        assert!(Tier::Core.rank() < Tier::Sympathy.rank());
        assert!(Tier::Sympathy.rank() < Tier::Network.rank());
    }

    #[test]
    fn test_special_tier_flags() {
        assert!(Tier::RoleModel.definition().ranked);
        assert!(!Tier::Parasocial.definition().reciprocal);
        assert!(!Tier::Acquainted.definition().direct_add);
        assert!(Tier::Core.definition().direct_add);
    }

    #[test]
    fn test_parse_roundtrip() {
        for tier in Tier::ALL {
            assert_eq!(Tier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(Tier::parse("inner"), None);
    }
}
