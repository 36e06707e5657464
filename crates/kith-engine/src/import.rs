//! Bulk contact import into the acquainted tier
//!
//! The import collaborator supplies batches of candidate records; each
//! one goes through the same capacity contract as a direct add, one
//! record at a time. A full tier or a duplicate stops that candidate
//! only - partial success, never all-or-nothing.

use crate::graph::{CircleGraph, RecordDraft};
use kith_domain::{ContactMethod, RecordId, Tier};

/// A candidate record supplied by the import pipeline
#[derive(Debug, Clone)]
pub struct ImportCandidate {
    /// Display name from the source address book
    pub display_name: String,

    /// Contact methods carried over from the source
    pub contact_methods: Vec<ContactMethod>,
}

/// Per-candidate result of a batch import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    /// The candidate was added
    Added {
        /// Name of the added candidate
        display_name: String,
        /// Id of the new record
        record: RecordId,
    },

    /// A contact method value already belongs to an existing record
    Duplicate {
        /// Name of the skipped candidate
        display_name: String,
        /// The record that already holds the matching contact value
        existing: RecordId,
    },

    /// The acquainted tier had no room left for this candidate
    TierFull {
        /// Name of the skipped candidate
        display_name: String,
    },
}

/// Import a batch of candidates into the acquainted tier
///
/// Duplicate detection is exact contact-value matching against every
/// existing record in the graph; fuzzy identity matching is out of scope.
pub fn import_batch(graph: &mut CircleGraph, candidates: Vec<ImportCandidate>) -> Vec<ImportOutcome> {
    let mut outcomes = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        if let Some(existing) = find_duplicate(graph, &candidate) {
            tracing::debug!(name = %candidate.display_name, existing = %existing, "import skipped duplicate");
            outcomes.push(ImportOutcome::Duplicate {
                display_name: candidate.display_name,
                existing,
            });
            continue;
        }

        let draft = RecordDraft {
            display_name: candidate.display_name.clone(),
            contact_methods: candidate.contact_methods,
            ranking_reason: None,
        };

        match graph.import_record(Tier::Acquainted, draft) {
            Ok(record) => outcomes.push(ImportOutcome::Added {
                display_name: candidate.display_name,
                record: record.id,
            }),
            Err(_) => {
                tracing::debug!(name = %candidate.display_name, "import hit full tier");
                outcomes.push(ImportOutcome::TierFull {
                    display_name: candidate.display_name,
                });
            }
        }
    }

    outcomes
}

fn find_duplicate(graph: &CircleGraph, candidate: &ImportCandidate) -> Option<RecordId> {
    for record in graph.records() {
        for existing in &record.contact_methods {
            if candidate
                .contact_methods
                .iter()
                .any(|m| m.kind == existing.kind && m.value == existing.value)
            {
                return Some(record.id);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use kith_domain::{ContactKind, UserId};

    fn candidate(name: &str, phone: &str) -> ImportCandidate {
        ImportCandidate {
            display_name: name.to_string(),
            contact_methods: vec![ContactMethod::new(ContactKind::Phone, phone)],
        }
    }

    #[test]
    fn test_batch_lands_in_acquainted_tier() {
        let mut graph = CircleGraph::new(UserId::new());
        let outcomes = import_batch(
            &mut graph,
            vec![candidate("A", "+1"), candidate("B", "+2")],
        );

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| matches!(o, ImportOutcome::Added { .. })));
        assert_eq!(graph.records_in_tier(Tier::Acquainted).len(), 2);
    }

    #[test]
    fn test_duplicate_contact_value_is_skipped() {
        let mut graph = CircleGraph::new(UserId::new());
        import_batch(&mut graph, vec![candidate("A", "+1")]);

        let outcomes = import_batch(&mut graph, vec![candidate("A again", "+1")]);
        assert!(matches!(outcomes[0], ImportOutcome::Duplicate { .. }));
        assert_eq!(graph.records().len(), 1);
    }

    #[test]
    fn test_partial_success_when_tier_fills() {
        let mut graph = CircleGraph::new(UserId::new());
        // Reserve almost the whole acquainted tier
        let limit = Tier::Acquainted.capacity_limit();
        graph.create_group(Tier::Acquainted, limit - 1, None).unwrap();

        let outcomes = import_batch(
            &mut graph,
            vec![candidate("Fits", "+1"), candidate("DoesNot", "+2")],
        );

        assert!(matches!(outcomes[0], ImportOutcome::Added { .. }));
        assert!(matches!(outcomes[1], ImportOutcome::TierFull { .. }));
        assert_eq!(graph.records_in_tier(Tier::Acquainted).len(), 1);
    }
}
