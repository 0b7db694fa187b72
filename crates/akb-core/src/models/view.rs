//! Typed views over raw STIX records.
//!
//! The store is type-erased; callers get an [`AttackObject`], a closed
//! variant over the ten entity kinds plus relationship edges. A single
//! factory, [`AttackObject::from_record`], dispatches on the type tag.

use super::object::{ExternalReference, KillChainPhase, StixObject};
use super::relationship::Relationship;
use super::types::{Domain, StixType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Fields shared by every entity kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectMeta {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// `revoked`, false when absent from the record.
    pub revoked: bool,
    /// `x_mitre_deprecated`, false when absent from the record.
    pub deprecated: bool,
    pub external_references: Vec<ExternalReference>,
}

impl ObjectMeta {
    fn from_record(record: &StixObject) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone().unwrap_or_default(),
            description: record.description.clone(),
            created: record.created,
            modified: record.modified,
            revoked: record.revoked.unwrap_or(false),
            deprecated: record.x_mitre_deprecated.unwrap_or(false),
            external_references: record.external_references.clone(),
        }
    }
}

/// A technique or sub-technique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Technique {
    pub meta: ObjectMeta,
    pub platforms: Vec<String>,
    pub kill_chain_phases: Vec<KillChainPhase>,
    pub is_subtechnique: bool,
}

impl Technique {
    /// Tactic shortnames this technique is placed under in `domain`.
    pub fn tactics(&self, domain: Domain) -> impl Iterator<Item = &str> + '_ {
        self.kill_chain_phases
            .iter()
            .filter(move |p| p.kill_chain_name == domain.kill_chain_name())
            .map(|p| p.phase_name.as_str())
    }
}

/// Malware or a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Software {
    pub meta: ObjectMeta,
    pub aliases: Vec<String>,
    pub platforms: Vec<String>,
}

/// An adversary group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub meta: ObjectMeta,
    pub aliases: Vec<String>,
}

/// A campaign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Campaign {
    pub meta: ObjectMeta,
    pub aliases: Vec<String>,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

/// A mitigation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mitigation {
    pub meta: ObjectMeta,
}

/// A matrix and the ordered tactics it displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Matrix {
    pub meta: ObjectMeta,
    /// Tactic identifiers in kill-chain display order.
    pub tactic_refs: Vec<String>,
}

/// A tactic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tactic {
    pub meta: ObjectMeta,
    /// Shortname used as `phase_name` in technique kill-chain phases.
    pub shortname: String,
}

/// A data source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSource {
    pub meta: ObjectMeta,
    pub platforms: Vec<String>,
    pub collection_layers: Vec<String>,
}

/// A data component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataComponent {
    pub meta: ObjectMeta,
    pub data_source_ref: Option<String>,
}

/// A typed knowledge base object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AttackObject {
    #[serde(rename = "attack-pattern")]
    Technique(Technique),
    Malware(Software),
    Tool(Software),
    #[serde(rename = "intrusion-set")]
    Group(Group),
    Campaign(Campaign),
    #[serde(rename = "course-of-action")]
    Mitigation(Mitigation),
    #[serde(rename = "x-mitre-matrix")]
    Matrix(Matrix),
    #[serde(rename = "x-mitre-tactic")]
    Tactic(Tactic),
    #[serde(rename = "x-mitre-data-source")]
    DataSource(DataSource),
    #[serde(rename = "x-mitre-data-component")]
    DataComponent(DataComponent),
    Relationship(Relationship),
}

impl AttackObject {
    /// Builds the typed view for a raw record.
    ///
    /// Returns `None` for record types outside the vocabulary (identities,
    /// marking definitions, ...) and for malformed relationships.
    pub fn from_record(record: &StixObject) -> Option<Self> {
        if record.is_relationship() {
            return Relationship::from_record(record).map(AttackObject::Relationship);
        }

        let meta = ObjectMeta::from_record(record);
        let object = match record.stix_type()? {
            StixType::Technique => AttackObject::Technique(Technique {
                meta,
                platforms: record.x_mitre_platforms.clone(),
                kill_chain_phases: record.kill_chain_phases.clone(),
                is_subtechnique: record.x_mitre_is_subtechnique.unwrap_or(false),
            }),
            StixType::Malware => AttackObject::Malware(Software {
                meta,
                aliases: record.x_mitre_aliases.clone(),
                platforms: record.x_mitre_platforms.clone(),
            }),
            StixType::Tool => AttackObject::Tool(Software {
                meta,
                aliases: record.x_mitre_aliases.clone(),
                platforms: record.x_mitre_platforms.clone(),
            }),
            StixType::Group => AttackObject::Group(Group {
                meta,
                aliases: record.aliases.clone(),
            }),
            StixType::Campaign => AttackObject::Campaign(Campaign {
                meta,
                aliases: record.aliases.clone(),
                first_seen: record.first_seen,
                last_seen: record.last_seen,
            }),
            StixType::Mitigation => AttackObject::Mitigation(Mitigation { meta }),
            StixType::Matrix => AttackObject::Matrix(Matrix {
                meta,
                tactic_refs: record.tactic_refs.clone(),
            }),
            StixType::Tactic => AttackObject::Tactic(Tactic {
                meta,
                shortname: record.x_mitre_shortname.clone().unwrap_or_default(),
            }),
            StixType::DataSource => AttackObject::DataSource(DataSource {
                meta,
                platforms: record.x_mitre_platforms.clone(),
                collection_layers: record.x_mitre_collection_layers.clone(),
            }),
            StixType::DataComponent => AttackObject::DataComponent(DataComponent {
                meta,
                data_source_ref: record.x_mitre_data_source_ref.clone(),
            }),
        };
        Some(object)
    }

    /// Materializes a possibly absent record; absence passes through.
    pub fn materialize(record: Option<&StixObject>) -> Option<Self> {
        record.and_then(Self::from_record)
    }

    /// Shared entity fields, `None` for relationships.
    pub fn meta(&self) -> Option<&ObjectMeta> {
        match self {
            AttackObject::Technique(t) => Some(&t.meta),
            AttackObject::Malware(s) | AttackObject::Tool(s) => Some(&s.meta),
            AttackObject::Group(g) => Some(&g.meta),
            AttackObject::Campaign(c) => Some(&c.meta),
            AttackObject::Mitigation(m) => Some(&m.meta),
            AttackObject::Matrix(m) => Some(&m.meta),
            AttackObject::Tactic(t) => Some(&t.meta),
            AttackObject::DataSource(d) => Some(&d.meta),
            AttackObject::DataComponent(d) => Some(&d.meta),
            AttackObject::Relationship(_) => None,
        }
    }

    /// STIX id of the object or edge.
    pub fn id(&self) -> &str {
        match self {
            AttackObject::Relationship(r) => &r.id,
            _ => self.meta().map(|m| m.id.as_str()).unwrap_or_default(),
        }
    }

    /// Entity name, `None` for relationships.
    pub fn name(&self) -> Option<&str> {
        self.meta().map(|m| m.name.as_str())
    }

    /// Description of the entity or edge, if present.
    pub fn description(&self) -> Option<&str> {
        match self {
            AttackObject::Relationship(r) => r.description.as_deref(),
            _ => self.meta().and_then(|m| m.description.as_deref()),
        }
    }

    /// Entity type, `None` for relationships.
    pub fn stix_type(&self) -> Option<StixType> {
        let stix_type = match self {
            AttackObject::Technique(_) => StixType::Technique,
            AttackObject::Malware(_) => StixType::Malware,
            AttackObject::Tool(_) => StixType::Tool,
            AttackObject::Group(_) => StixType::Group,
            AttackObject::Campaign(_) => StixType::Campaign,
            AttackObject::Mitigation(_) => StixType::Mitigation,
            AttackObject::Matrix(_) => StixType::Matrix,
            AttackObject::Tactic(_) => StixType::Tactic,
            AttackObject::DataSource(_) => StixType::DataSource,
            AttackObject::DataComponent(_) => StixType::DataComponent,
            AttackObject::Relationship(_) => return None,
        };
        Some(stix_type)
    }

    /// The human-facing id published under `source_name`.
    pub fn external_id(&self, source_name: &str) -> Option<&str> {
        self.meta()?
            .external_references
            .iter()
            .find(|r| r.source_name == source_name)
            .and_then(|r| r.external_id.as_deref())
    }

    /// The technique view, if this is a technique.
    pub fn as_technique(&self) -> Option<&Technique> {
        match self {
            AttackObject::Technique(t) => Some(t),
            _ => None,
        }
    }

    /// The matrix view, if this is a matrix.
    pub fn as_matrix(&self) -> Option<&Matrix> {
        match self {
            AttackObject::Matrix(m) => Some(m),
            _ => None,
        }
    }

    /// The tactic view, if this is a tactic.
    pub fn as_tactic(&self) -> Option<&Tactic> {
        match self {
            AttackObject::Tactic(t) => Some(t),
            _ => None,
        }
    }

    /// The edge, if this is a relationship.
    pub fn as_relationship(&self) -> Option<&Relationship> {
        match self {
            AttackObject::Relationship(r) => Some(r),
            _ => None,
        }
    }
}
