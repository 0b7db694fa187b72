//! Single-object lookups.

use super::AttackKnowledgeBase;
use crate::error::{KnowledgeBaseError, KnowledgeBaseResult};
use crate::models::{AttackObject, RelationshipType, StixType};
use crate::store::{EntityStore, Filter};
use std::collections::HashSet;

impl<S: EntityStore> AttackKnowledgeBase<S> {
    /// Looks up an object by STIX id. Absent ids yield `None`.
    pub fn get_object_by_stix_id(&self, stix_id: &str) -> Option<AttackObject> {
        AttackObject::materialize(self.store.get(stix_id))
    }

    /// Looks up an object by its ATT&CK id (e.g. `T1059`).
    ///
    /// When several objects carry the id the first in store order wins.
    pub fn get_object_by_attack_id(
        &self,
        attack_id: &str,
        stix_type: StixType,
    ) -> KnowledgeBaseResult<AttackObject> {
        let filters = [
            Filter::Type(stix_type),
            Filter::ExternalId {
                source_name: self.source_name.clone(),
                external_id: attack_id.to_string(),
            },
        ];
        self.first_match(&filters)
            .ok_or_else(|| not_found(stix_type, "ATT&CK id", attack_id))
    }

    /// Looks up an object of `stix_type` by exact name.
    pub fn get_object_by_name(
        &self,
        name: &str,
        stix_type: StixType,
    ) -> KnowledgeBaseResult<AttackObject> {
        let filters = [Filter::Type(stix_type), Filter::Name(name.to_string())];
        self.first_match(&filters)
            .ok_or_else(|| not_found(stix_type, "name", name))
    }

    pub fn get_group_by_alias(&self, alias: &str) -> KnowledgeBaseResult<AttackObject> {
        self.by_alias(StixType::Group, alias)
    }

    pub fn get_campaign_by_alias(&self, alias: &str) -> KnowledgeBaseResult<AttackObject> {
        self.by_alias(StixType::Campaign, alias)
    }

    /// Looks up software by alias. Malware is searched before tools.
    pub fn get_software_by_alias(&self, alias: &str) -> KnowledgeBaseResult<AttackObject> {
        [StixType::Malware, StixType::Tool]
            .into_iter()
            .find_map(|stix_type| {
                self.first_match(&[
                    Filter::Type(stix_type),
                    Filter::SoftwareAliasesContain(alias.to_string()),
                ])
            })
            .ok_or_else(|| KnowledgeBaseError::NotFound(format!("software with alias '{}'", alias)))
    }

    /// ATT&CK id of the object, taken from its canonical external reference.
    pub fn get_attack_id(&self, stix_id: &str) -> Option<String> {
        self.store
            .get(stix_id)?
            .external_id(&self.source_name)
            .map(str::to_string)
    }

    /// Entity type encoded in the id prefix. No store access.
    pub fn get_object_type(&self, stix_id: &str) -> Option<StixType> {
        StixType::from_stix_id(stix_id)
    }

    /// The object that replaced a revoked object, if any.
    ///
    /// Follows `revoked-by` edges from `stix_id` and returns the first
    /// target that is not itself revoked.
    pub fn get_revoked_by(&self, stix_id: &str) -> Option<AttackObject> {
        let targets: HashSet<String> = self
            .store
            .relationships_from(stix_id, RelationshipType::RevokedBy)
            .into_iter()
            .filter_map(|r| r.target_ref.clone())
            .collect();
        if targets.is_empty() {
            return None;
        }
        self.first_match(&[Filter::IdIn(targets), Filter::NotRevoked])
    }

    /// Techniques used by the software a group uses.
    ///
    /// Each technique appears once, in store order.
    pub fn get_techniques_used_by_group_software(&self, group_id: &str) -> Vec<AttackObject> {
        let software: HashSet<String> = self
            .store
            .relationships_from(group_id, RelationshipType::Uses)
            .into_iter()
            .filter_map(|r| r.target_ref.clone())
            .filter(|target| StixType::from_stix_id(target).is_some_and(|t| t.is_software()))
            .collect();
        if software.is_empty() {
            return Vec::new();
        }

        let techniques: HashSet<String> = self
            .store
            .query(&[
                Filter::IsRelationship,
                Filter::RelationshipType(RelationshipType::Uses),
                Filter::SourceRefIn(software),
            ])
            .into_iter()
            .filter_map(|r| r.target_ref.clone())
            .collect();

        self.store
            .query(&[Filter::Type(StixType::Technique), Filter::IdIn(techniques)])
            .into_iter()
            .filter_map(AttackObject::from_record)
            .collect()
    }

    fn by_alias(&self, stix_type: StixType, alias: &str) -> KnowledgeBaseResult<AttackObject> {
        self.first_match(&[
            Filter::Type(stix_type),
            Filter::AliasesContain(alias.to_string()),
        ])
        .ok_or_else(|| not_found(stix_type, "alias", alias))
    }

    fn first_match(&self, filters: &[Filter]) -> Option<AttackObject> {
        self.store
            .query(filters)
            .into_iter()
            .find_map(AttackObject::from_record)
    }
}

fn not_found(stix_type: StixType, field: &str, value: &str) -> KnowledgeBaseError {
    KnowledgeBaseError::NotFound(format!("{} with {} '{}'", stix_type, field, value))
}
