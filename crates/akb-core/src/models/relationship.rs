//! Relationship edge model.
//!
//! Relationships are directed, typed facts connecting two entity identifiers.
//! The type of each end is carried by the identifier prefix, so an edge can be
//! type-checked without looking its endpoints up.

use super::object::StixObject;
use super::types::StixType;
use crate::error::KnowledgeBaseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A materialized relationship between two entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Unique identifier for this relationship.
    pub id: String,
    /// Type of relationship.
    pub relationship_type: RelationshipType,
    /// Source entity identifier.
    pub source_ref: String,
    /// Target entity identifier.
    pub target_ref: String,
    /// Free-text context, usually with citations.
    pub description: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub revoked: bool,
    pub deprecated: bool,
}

impl Relationship {
    /// Creates a new relationship between two entities.
    pub fn new(
        id: impl Into<String>,
        source_ref: impl Into<String>,
        relationship_type: RelationshipType,
        target_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            relationship_type,
            source_ref: source_ref.into(),
            target_ref: target_ref.into(),
            description: None,
            created: None,
            modified: None,
            revoked: false,
            deprecated: false,
        }
    }

    /// Builds a relationship from a raw record.
    ///
    /// Returns `None` when the record is not a relationship, lacks either
    /// endpoint, or carries a relationship type outside the vocabulary.
    pub fn from_record(record: &StixObject) -> Option<Self> {
        if !record.is_relationship() {
            return None;
        }
        let relationship_type = record.relationship_type.as_deref()?.parse().ok()?;
        Some(Self {
            id: record.id.clone(),
            relationship_type,
            source_ref: record.source_ref.clone()?,
            target_ref: record.target_ref.clone()?,
            description: record.description.clone(),
            created: record.created,
            modified: record.modified,
            revoked: record.revoked.unwrap_or(false),
            deprecated: record.x_mitre_deprecated.unwrap_or(false),
        })
    }

    /// Type of the source entity, from its identifier prefix.
    pub fn source_type(&self) -> Option<StixType> {
        StixType::from_stix_id(&self.source_ref)
    }

    /// Type of the target entity, from its identifier prefix.
    pub fn target_type(&self) -> Option<StixType> {
        StixType::from_stix_id(&self.target_ref)
    }

    /// Returns true if this relationship connects `source_type` to `target_type`.
    pub fn connects(&self, source_type: StixType, target_type: StixType) -> bool {
        self.source_type() == Some(source_type) && self.target_type() == Some(target_type)
    }

    /// Returns `(anchor, related)` identifiers for the given direction.
    pub fn endpoints(&self, direction: Direction) -> (&str, &str) {
        match direction {
            Direction::Forward => (&self.source_ref, &self.target_ref),
            Direction::Reverse => (&self.target_ref, &self.source_ref),
        }
    }
}

/// Type of relationship between entities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    /// Group, campaign or software uses a technique or software.
    Uses,
    /// Mitigation mitigates a technique.
    Mitigates,
    /// Data component detects a technique.
    Detects,
    /// Campaign is attributed to a group.
    AttributedTo,
    /// Sub-technique belongs to a parent technique.
    SubtechniqueOf,
    /// Object was superseded by another object.
    RevokedBy,
}

impl RelationshipType {
    /// Every recognized relationship type.
    pub const ALL: [RelationshipType; 6] = [
        RelationshipType::Uses,
        RelationshipType::Mitigates,
        RelationshipType::Detects,
        RelationshipType::AttributedTo,
        RelationshipType::SubtechniqueOf,
        RelationshipType::RevokedBy,
    ];

    /// Returns the STIX relationship type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Uses => "uses",
            RelationshipType::Mitigates => "mitigates",
            RelationshipType::Detects => "detects",
            RelationshipType::AttributedTo => "attributed-to",
            RelationshipType::SubtechniqueOf => "subtechnique-of",
            RelationshipType::RevokedBy => "revoked-by",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = KnowledgeBaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                KnowledgeBaseError::invalid_argument(
                    "relationship type",
                    s,
                    RelationshipType::ALL.iter().map(RelationshipType::as_str),
                )
            })
    }
}

/// Which end of an edge keys a resolved mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// Key by `source_ref`, relate to `target_ref`.
    #[default]
    Forward,
    /// Key by `target_ref`, relate to `source_ref`.
    Reverse,
}
