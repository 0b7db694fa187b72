//! Entity store.
//!
//! Provides the storage trait the knowledge base queries, the predicate
//! filters it accepts, and an in-memory implementation loaded from a STIX
//! bundle.

mod memory;

pub use memory::MemoryStore;

use crate::models::{RelationshipType, StixObject, StixType};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A predicate on a raw record. Filters passed together are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `type` equals the entity type.
    Type(StixType),
    /// `type` equals `relationship`.
    IsRelationship,
    /// `id` equals the value.
    Id(String),
    /// `id` is one of the values.
    IdIn(HashSet<String>),
    /// `name` equals the value.
    Name(String),
    /// `aliases` contains the value.
    AliasesContain(String),
    /// `x_mitre_aliases` contains the value.
    SoftwareAliasesContain(String),
    /// An external reference carries this id under this source.
    ExternalId {
        source_name: String,
        external_id: String,
    },
    /// `x_mitre_platforms` contains the value.
    PlatformsContain(String),
    /// A kill-chain phase matches both the chain and the phase.
    KillChainPhase {
        kill_chain_name: String,
        phase_name: String,
    },
    /// `relationship_type` equals the value.
    RelationshipType(RelationshipType),
    /// `source_ref` equals the value.
    SourceRef(String),
    /// `source_ref` is one of the values.
    SourceRefIn(HashSet<String>),
    /// `revoked` is not true.
    NotRevoked,
    /// `created` is strictly after the instant.
    CreatedAfter(DateTime<Utc>),
    /// `modified` is strictly after the instant.
    ModifiedAfter(DateTime<Utc>),
}

impl Filter {
    /// Returns true if the record satisfies this predicate.
    pub fn matches(&self, record: &StixObject) -> bool {
        match self {
            Filter::Type(stix_type) => record.object_type == stix_type.as_str(),
            Filter::IsRelationship => record.is_relationship(),
            Filter::Id(id) => &record.id == id,
            Filter::IdIn(ids) => ids.contains(&record.id),
            Filter::Name(name) => record.name.as_deref() == Some(name.as_str()),
            Filter::AliasesContain(alias) => record.aliases.iter().any(|a| a == alias),
            Filter::SoftwareAliasesContain(alias) => {
                record.x_mitre_aliases.iter().any(|a| a == alias)
            }
            Filter::ExternalId {
                source_name,
                external_id,
            } => record.has_external_id(source_name, external_id),
            Filter::PlatformsContain(platform) => {
                record.x_mitre_platforms.iter().any(|p| p == platform)
            }
            Filter::KillChainPhase {
                kill_chain_name,
                phase_name,
            } => record
                .kill_chain_phases
                .iter()
                .any(|p| &p.kill_chain_name == kill_chain_name && &p.phase_name == phase_name),
            Filter::RelationshipType(relationship_type) => {
                record.relationship_type.as_deref() == Some(relationship_type.as_str())
            }
            Filter::SourceRef(source_ref) => {
                record.source_ref.as_deref() == Some(source_ref.as_str())
            }
            Filter::SourceRefIn(source_refs) => record
                .source_ref
                .as_ref()
                .is_some_and(|s| source_refs.contains(s)),
            Filter::NotRevoked => record.revoked != Some(true),
            Filter::CreatedAfter(instant) => record.created.is_some_and(|c| c > *instant),
            Filter::ModifiedAfter(instant) => record.modified.is_some_and(|m| m > *instant),
        }
    }
}

/// Read-only access to the loaded records.
///
/// Implementations hold an immutable snapshot; every method takes `&self`
/// so a store can be shared by concurrent readers.
pub trait EntityStore: Send + Sync {
    /// Returns every record matching all filters, in store order.
    ///
    /// An empty filter list matches every record.
    fn query(&self, filters: &[Filter]) -> Vec<&StixObject>;

    /// Looks up a single record by its STIX id.
    fn get(&self, stix_id: &str) -> Option<&StixObject>;

    /// Number of records held.
    fn len(&self) -> usize;

    /// Returns true when the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Relationship records of the given type whose source is `source_id`.
    fn relationships_from(
        &self,
        source_id: &str,
        relationship_type: RelationshipType,
    ) -> Vec<&StixObject> {
        self.query(&[
            Filter::IsRelationship,
            Filter::RelationshipType(relationship_type),
            Filter::SourceRef(source_id.to_string()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExternalReference, KillChainPhase};
    use chrono::TimeZone;

    fn technique() -> StixObject {
        let mut record = StixObject::new("attack-pattern--1", "attack-pattern");
        record.name = Some("Phishing".to_string());
        record.x_mitre_platforms = vec!["Windows".to_string(), "macOS".to_string()];
        record.kill_chain_phases = vec![
            KillChainPhase {
                kill_chain_name: "mitre-attack".to_string(),
                phase_name: "initial-access".to_string(),
            },
            KillChainPhase {
                kill_chain_name: "mitre-mobile-attack".to_string(),
                phase_name: "collection".to_string(),
            },
        ];
        record.external_references = vec![ExternalReference::new("mitre-attack", "T1566")];
        record.created = Some(Utc.with_ymd_and_hms(2020, 3, 2, 0, 0, 0).unwrap());
        record
    }

    #[test]
    fn test_type_and_name_filters() {
        let record = technique();
        assert!(Filter::Type(StixType::Technique).matches(&record));
        assert!(!Filter::Type(StixType::Tool).matches(&record));
        assert!(!Filter::IsRelationship.matches(&record));
        assert!(Filter::Name("Phishing".to_string()).matches(&record));
        assert!(!Filter::Name("phishing".to_string()).matches(&record));
    }

    #[test]
    fn test_containment_filters() {
        let record = technique();
        assert!(Filter::PlatformsContain("macOS".to_string()).matches(&record));
        assert!(!Filter::PlatformsContain("Linux".to_string()).matches(&record));
        assert!(Filter::IdIn(HashSet::from(["attack-pattern--1".to_string()])).matches(&record));
        assert!(Filter::ExternalId {
            source_name: "mitre-attack".to_string(),
            external_id: "T1566".to_string(),
        }
        .matches(&record));
    }

    #[test]
    fn test_kill_chain_phase_requires_both_fields_on_one_phase() {
        let record = technique();
        assert!(Filter::KillChainPhase {
            kill_chain_name: "mitre-attack".to_string(),
            phase_name: "initial-access".to_string(),
        }
        .matches(&record));
        assert!(!Filter::KillChainPhase {
            kill_chain_name: "mitre-attack".to_string(),
            phase_name: "collection".to_string(),
        }
        .matches(&record));
    }

    #[test]
    fn test_revocation_and_time_filters() {
        let mut record = technique();
        assert!(Filter::NotRevoked.matches(&record));
        record.revoked = Some(false);
        assert!(Filter::NotRevoked.matches(&record));
        record.revoked = Some(true);
        assert!(!Filter::NotRevoked.matches(&record));

        let before = Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        let exact = Utc.with_ymd_and_hms(2020, 3, 2, 0, 0, 0).unwrap();
        assert!(Filter::CreatedAfter(before).matches(&record));
        assert!(!Filter::CreatedAfter(exact).matches(&record));
        assert!(!Filter::ModifiedAfter(before).matches(&record));
    }

    #[test]
    fn test_relationship_filters() {
        let mut record = StixObject::new("relationship--1", "relationship");
        record.relationship_type = Some("uses".to_string());
        record.source_ref = Some("intrusion-set--1".to_string());
        record.target_ref = Some("malware--1".to_string());

        assert!(Filter::IsRelationship.matches(&record));
        assert!(Filter::RelationshipType(RelationshipType::Uses).matches(&record));
        assert!(!Filter::RelationshipType(RelationshipType::Detects).matches(&record));
        assert!(Filter::SourceRef("intrusion-set--1".to_string()).matches(&record));
        assert!(
            Filter::SourceRefIn(HashSet::from(["intrusion-set--1".to_string()])).matches(&record)
        );
        assert!(!Filter::SourceRefIn(HashSet::new()).matches(&record));
    }
}
