//! The ATT&CK knowledge base facade.
//!
//! [`AttackKnowledgeBase`] wraps an [`EntityStore`] and exposes per-type
//! accessors, lookup helpers and the composite relationship queries. The
//! store is loaded once and never mutated, so every query is a pure function
//! of the snapshot.

mod lookup;
mod relationships;

use crate::config::KnowledgeBaseConfig;
use crate::error::KnowledgeBaseResult;
use crate::models::{
    AttackObject, Direction, Domain, Matrix, RelationshipType, StixObject, StixType, Tactic,
};
use crate::resolver::{self, RelationshipMap};
use crate::revocation::remove_revoked_deprecated;
use crate::store::{EntityStore, Filter, MemoryStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Default namespace of human-facing ATT&CK ids in external references.
pub const DEFAULT_SOURCE_NAME: &str = "mitre-attack";

/// A matrix and its tactics in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixTactics {
    pub matrix: Matrix,
    pub tactics: Vec<Tactic>,
}

/// Read-only query surface over a loaded ATT&CK bundle.
#[derive(Debug, Clone)]
pub struct AttackKnowledgeBase<S: EntityStore = MemoryStore> {
    store: S,
    source_name: String,
}

impl AttackKnowledgeBase<MemoryStore> {
    /// Loads a STIX bundle file into memory.
    pub fn from_file(path: impl AsRef<Path>) -> KnowledgeBaseResult<Self> {
        Ok(Self::with_store(MemoryStore::load_from_file(path)?))
    }

    /// Loads the bundle named by the configuration.
    pub fn from_config(config: &KnowledgeBaseConfig) -> KnowledgeBaseResult<Self> {
        let kb = Self::from_file(&config.bundle_path)?.with_source_name(&config.source_name);
        info!(
            bundle = %config.bundle_path.display(),
            source_name = %kb.source_name,
            "Knowledge base ready"
        );
        Ok(kb)
    }
}

impl<S: EntityStore> AttackKnowledgeBase<S> {
    /// Wraps an already loaded store.
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            source_name: DEFAULT_SOURCE_NAME.to_string(),
        }
    }

    /// Sets the external-reference namespace used for ATT&CK ids.
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = source_name.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// One-hop relationship mapping; see [`resolver::resolve_related`].
    pub fn resolve_related(
        &self,
        source_type: StixType,
        relationship_type: RelationshipType,
        target_type: StixType,
        direction: Direction,
    ) -> RelationshipMap {
        resolver::resolve_related(
            &self.store,
            source_type,
            relationship_type,
            target_type,
            direction,
        )
    }

    fn select(&self, filters: &[Filter], remove_revoked: bool) -> Vec<AttackObject> {
        let records = self.store.query(filters);
        let records = if remove_revoked {
            remove_revoked_deprecated(records)
        } else {
            records
        };
        materialize_all(records)
    }

    // ------------------------------------------------------------------
    // Per-type accessors
    // ------------------------------------------------------------------

    /// All objects of one type.
    pub fn get_all(&self, stix_type: StixType, remove_revoked: bool) -> Vec<AttackObject> {
        self.select(&[Filter::Type(stix_type)], remove_revoked)
    }

    pub fn get_matrices(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::Matrix, remove_revoked)
    }

    pub fn get_tactics(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::Tactic, remove_revoked)
    }

    pub fn get_techniques(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::Technique, remove_revoked)
    }

    pub fn get_mitigations(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::Mitigation, remove_revoked)
    }

    pub fn get_groups(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::Group, remove_revoked)
    }

    /// Tools followed by malware.
    pub fn get_software(&self, remove_revoked: bool) -> Vec<AttackObject> {
        StixType::SOFTWARE
            .into_iter()
            .flat_map(|t| self.get_all(t, remove_revoked))
            .collect()
    }

    pub fn get_campaigns(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::Campaign, remove_revoked)
    }

    pub fn get_datasources(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::DataSource, remove_revoked)
    }

    pub fn get_datacomponents(&self, remove_revoked: bool) -> Vec<AttackObject> {
        self.get_all(StixType::DataComponent, remove_revoked)
    }

    // ------------------------------------------------------------------
    // Queries by value
    // ------------------------------------------------------------------

    /// Objects whose description contains `content`, ignoring case.
    ///
    /// Without `object_type` every record is searched, relationships
    /// included. Revocation filtering runs after the substring match.
    pub fn get_objects_by_content(
        &self,
        content: &str,
        object_type: Option<StixType>,
        remove_revoked: bool,
    ) -> Vec<AttackObject> {
        let filters: Vec<Filter> = object_type.map(Filter::Type).into_iter().collect();
        let needle = content.to_lowercase();
        let matches: Vec<&StixObject> = self
            .store
            .query(&filters)
            .into_iter()
            .filter(|r| {
                r.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .collect();
        let matches = if remove_revoked {
            remove_revoked_deprecated(matches)
        } else {
            matches
        };
        materialize_all(matches)
    }

    /// Techniques available on `platform`.
    pub fn get_techniques_by_platform(
        &self,
        platform: &str,
        remove_revoked: bool,
    ) -> Vec<AttackObject> {
        self.select(
            &[
                Filter::Type(StixType::Technique),
                Filter::PlatformsContain(platform.to_string()),
            ],
            remove_revoked,
        )
    }

    /// Techniques placed under the tactic `tactic_shortname` in `domain`.
    pub fn get_techniques_by_tactic(
        &self,
        tactic_shortname: &str,
        domain: Domain,
        remove_revoked: bool,
    ) -> Vec<AttackObject> {
        self.select(
            &[
                Filter::Type(StixType::Technique),
                Filter::KillChainPhase {
                    kill_chain_name: domain.kill_chain_name().to_string(),
                    phase_name: tactic_shortname.to_string(),
                },
            ],
            remove_revoked,
        )
    }

    /// Tactics of every matrix, in each matrix's declared order.
    ///
    /// Matrices come in store order. Tactic references that do not resolve
    /// to a tactic are skipped.
    pub fn get_tactics_by_matrix(&self) -> Vec<MatrixTactics> {
        self.get_matrices(false)
            .iter()
            .filter_map(AttackObject::as_matrix)
            .map(|matrix| {
                let tactics = matrix
                    .tactic_refs
                    .iter()
                    .filter_map(|tactic_id| {
                        let tactic = AttackObject::materialize(self.store.get(tactic_id))
                            .and_then(|o| o.as_tactic().cloned());
                        if tactic.is_none() {
                            warn!(matrix = %matrix.meta.id, tactic = %tactic_id, "Matrix references unknown tactic");
                        }
                        tactic
                    })
                    .collect();
                MatrixTactics {
                    matrix: matrix.clone(),
                    tactics,
                }
            })
            .collect()
    }

    /// Objects created strictly after `timestamp`.
    pub fn get_objects_created_after(
        &self,
        timestamp: DateTime<Utc>,
        remove_revoked: bool,
    ) -> Vec<AttackObject> {
        self.select(&[Filter::CreatedAfter(timestamp)], remove_revoked)
    }

    /// Objects modified strictly after `timestamp`.
    pub fn get_objects_modified_after(
        &self,
        timestamp: DateTime<Utc>,
        remove_revoked: bool,
    ) -> Vec<AttackObject> {
        self.select(&[Filter::ModifiedAfter(timestamp)], remove_revoked)
    }
}

/// Materializes records, skipping types outside the vocabulary.
fn materialize_all<'a>(records: impl IntoIterator<Item = &'a StixObject>) -> Vec<AttackObject> {
    records
        .into_iter()
        .filter_map(AttackObject::from_record)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExternalReference;
    use chrono::TimeZone;

    fn entity(id: &str, object_type: &str, name: &str) -> StixObject {
        let mut record = StixObject::new(id, object_type);
        record.name = Some(name.to_string());
        record
    }

    fn kb(objects: Vec<StixObject>) -> AttackKnowledgeBase {
        AttackKnowledgeBase::with_store(MemoryStore::from_objects(objects))
    }

    #[test]
    fn test_get_all_returns_only_requested_type() {
        let mut revoked = entity("attack-pattern--2", "attack-pattern", "Old");
        revoked.revoked = Some(true);
        let mut deprecated = entity("attack-pattern--3", "attack-pattern", "Older");
        deprecated.x_mitre_deprecated = Some(true);
        let kb = kb(vec![
            entity("attack-pattern--1", "attack-pattern", "Current"),
            revoked,
            deprecated,
            entity("tool--1", "tool", "PsExec"),
            entity("identity--1", "identity", "MITRE"),
        ]);

        for stix_type in StixType::ALL {
            assert!(kb
                .get_all(stix_type, false)
                .iter()
                .all(|o| o.stix_type() == Some(stix_type)));
        }

        let all = kb.get_techniques(false);
        let current = kb.get_techniques(true);
        assert_eq!(all.len(), 3);
        assert_eq!(current.len(), 1);
        assert!(current.iter().all(|o| all.contains(o)));
        assert_eq!(current[0].id(), "attack-pattern--1");
    }

    #[test]
    fn test_get_software_lists_tools_then_malware() {
        let kb = kb(vec![
            entity("malware--1", "malware", "Emotet"),
            entity("tool--1", "tool", "PsExec"),
        ]);
        let ids: Vec<_> = kb.get_software(false).iter().map(|o| o.id().to_string()).collect();
        assert_eq!(ids, vec!["tool--1", "malware--1"]);
    }

    #[test]
    fn test_content_search_filters_revoked_after_match() {
        let mut techniques: Vec<StixObject> = (1..=4)
            .map(|i| {
                let mut t = entity(&format!("attack-pattern--{}", i), "attack-pattern", "T");
                t.description = Some(if i < 4 {
                    format!("Adversaries may abuse PowerShell ({})", i)
                } else {
                    "Unrelated".to_string()
                });
                t
            })
            .collect();
        techniques[1].revoked = Some(true);
        let kb = kb(techniques);

        let all = kb.get_objects_by_content("powershell", Some(StixType::Technique), false);
        assert_eq!(all.len(), 3);
        let current = kb.get_objects_by_content("POWERSHELL", Some(StixType::Technique), true);
        assert_eq!(current.len(), 2);
        assert!(kb
            .get_objects_by_content("powershell", Some(StixType::Tool), false)
            .is_empty());
        assert_eq!(kb.get_objects_by_content("powershell", None, false).len(), 3);
    }

    #[test]
    fn test_tactics_by_matrix_keeps_declared_order() {
        let mut matrix = entity("x-mitre-matrix--1", "x-mitre-matrix", "Enterprise ATT&CK");
        matrix.tactic_refs = vec![
            "x-mitre-tactic--2".to_string(),
            "x-mitre-tactic--404".to_string(),
            "x-mitre-tactic--1".to_string(),
        ];
        let kb = kb(vec![
            entity("x-mitre-tactic--1", "x-mitre-tactic", "Alpha"),
            entity("x-mitre-tactic--2", "x-mitre-tactic", "Zulu"),
            matrix,
        ]);

        let result = kb.get_tactics_by_matrix();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].matrix.meta.name, "Enterprise ATT&CK");
        let ids: Vec<_> = result[0].tactics.iter().map(|t| t.meta.id.as_str()).collect();
        assert_eq!(ids, vec!["x-mitre-tactic--2", "x-mitre-tactic--1"]);
    }

    #[test]
    fn test_techniques_by_platform_and_tactic() {
        let mut phishing = entity("attack-pattern--1", "attack-pattern", "Phishing");
        phishing.x_mitre_platforms = vec!["Linux".to_string()];
        phishing.kill_chain_phases = vec![crate::models::KillChainPhase {
            kill_chain_name: "mitre-attack".to_string(),
            phase_name: "initial-access".to_string(),
        }];
        let mut mobile = entity("attack-pattern--2", "attack-pattern", "Mobile");
        mobile.kill_chain_phases = vec![crate::models::KillChainPhase {
            kill_chain_name: "mitre-mobile-attack".to_string(),
            phase_name: "initial-access".to_string(),
        }];
        let kb = kb(vec![phishing, mobile]);

        assert_eq!(kb.get_techniques_by_platform("Linux", false).len(), 1);
        assert!(kb.get_techniques_by_platform("Windows", false).is_empty());

        let enterprise = kb.get_techniques_by_tactic("initial-access", Domain::Enterprise, false);
        assert_eq!(enterprise.len(), 1);
        assert_eq!(enterprise[0].id(), "attack-pattern--1");
        let mobile = kb.get_techniques_by_tactic("initial-access", Domain::Mobile, false);
        assert_eq!(mobile[0].id(), "attack-pattern--2");
        assert!(kb
            .get_techniques_by_tactic("initial-access", Domain::Ics, false)
            .is_empty());
    }

    #[test]
    fn test_created_and_modified_after() {
        let mut old = entity("course-of-action--1", "course-of-action", "Old");
        old.created = Some(Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap());
        old.modified = Some(Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap());
        let mut new = entity("course-of-action--2", "course-of-action", "New");
        new.created = Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        new.modified = Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap());
        new.external_references = vec![ExternalReference::new("mitre-attack", "M1050")];
        let kb = kb(vec![old, new]);

        let cutoff = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let created = kb.get_objects_created_after(cutoff, false);
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id(), "course-of-action--2");
        assert_eq!(kb.get_objects_modified_after(cutoff, false).len(), 2);
    }

    #[test]
    fn test_source_name_defaults_and_overrides() {
        let kb = kb(Vec::new());
        assert_eq!(kb.source_name(), DEFAULT_SOURCE_NAME);
        assert!(kb.store().is_empty());
        let kb = kb.with_source_name("mitre-ics-attack");
        assert_eq!(kb.source_name(), "mitre-ics-attack");
    }
}
