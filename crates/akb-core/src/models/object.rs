//! Raw STIX records as held by the entity store.
//!
//! A `StixObject` keeps every field any recognized object kind may carry, so
//! the store can stay type-erased. Typed views are built from it by
//! [`AttackObject::from_record`](super::AttackObject::from_record).

use super::types::{StixType, RELATIONSHIP_TYPE_TAG};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single STIX record from a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StixObject {
    /// Stable `<type>--<uuid>` identifier.
    pub id: String,
    /// STIX type tag.
    #[serde(rename = "type")]
    pub object_type: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub revoked: Option<bool>,
    pub x_mitre_deprecated: Option<bool>,
    #[serde(default)]
    pub external_references: Vec<ExternalReference>,

    /// Group and campaign aliases.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Software aliases.
    #[serde(default)]
    pub x_mitre_aliases: Vec<String>,
    #[serde(default)]
    pub x_mitre_platforms: Vec<String>,
    #[serde(default)]
    pub kill_chain_phases: Vec<KillChainPhase>,
    pub x_mitre_is_subtechnique: Option<bool>,
    /// Ordered tactic identifiers of a matrix.
    #[serde(default)]
    pub tactic_refs: Vec<String>,
    pub x_mitre_shortname: Option<String>,
    #[serde(default)]
    pub x_mitre_collection_layers: Vec<String>,
    pub x_mitre_data_source_ref: Option<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,

    pub relationship_type: Option<String>,
    pub source_ref: Option<String>,
    pub target_ref: Option<String>,
}

impl StixObject {
    /// Creates a bare record with only an id and type.
    pub fn new(id: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object_type: object_type.into(),
            name: None,
            description: None,
            created: None,
            modified: None,
            revoked: None,
            x_mitre_deprecated: None,
            external_references: Vec::new(),
            aliases: Vec::new(),
            x_mitre_aliases: Vec::new(),
            x_mitre_platforms: Vec::new(),
            kill_chain_phases: Vec::new(),
            x_mitre_is_subtechnique: None,
            tactic_refs: Vec::new(),
            x_mitre_shortname: None,
            x_mitre_collection_layers: Vec::new(),
            x_mitre_data_source_ref: None,
            first_seen: None,
            last_seen: None,
            relationship_type: None,
            source_ref: None,
            target_ref: None,
        }
    }

    /// Returns the recognized entity type, if any.
    pub fn stix_type(&self) -> Option<StixType> {
        self.object_type.parse().ok()
    }

    /// Returns true for relationship records.
    pub fn is_relationship(&self) -> bool {
        self.object_type == RELATIONSHIP_TYPE_TAG
    }

    /// Returns the external id published under `source_name`, if any.
    pub fn external_id(&self, source_name: &str) -> Option<&str> {
        self.external_references
            .iter()
            .find(|r| r.source_name == source_name)
            .and_then(|r| r.external_id.as_deref())
    }

    /// Returns true if any external reference carries this id under `source_name`.
    pub fn has_external_id(&self, source_name: &str, external_id: &str) -> bool {
        self.external_references
            .iter()
            .any(|r| r.source_name == source_name && r.external_id.as_deref() == Some(external_id))
    }
}

/// An entry of a record's `external_references` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReference {
    pub source_name: String,
    pub external_id: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl ExternalReference {
    /// Creates a reference carrying a human-facing id.
    pub fn new(source_name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            external_id: Some(external_id.into()),
            url: None,
            description: None,
        }
    }
}

/// A technique's placement in a kill chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillChainPhase {
    pub kill_chain_name: String,
    pub phase_name: String,
}
