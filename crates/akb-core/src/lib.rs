//! # akb-core
//!
//! Read-only query layer over a MITRE ATT&CK STIX 2.0 bundle.
//!
//! This crate loads a bundle into an in-memory entity store and exposes typed
//! views of techniques, software, groups, campaigns, mitigations, tactics,
//! matrices and data sources, plus the one-hop and bridged relationship
//! mappings between them.

pub mod config;
pub mod error;
pub mod knowledge_base;
pub mod models;
pub mod resolver;
pub mod revocation;
pub mod store;

pub use config::{load_config, ConfigError, KnowledgeBaseConfig, LoggingSettings};
pub use error::{KnowledgeBaseError, KnowledgeBaseResult};
pub use knowledge_base::{AttackKnowledgeBase, MatrixTactics, DEFAULT_SOURCE_NAME};
pub use models::{
    AttackObject, Campaign, DataComponent, DataSource, Direction, Domain, ExternalReference,
    Group, KillChainPhase, Matrix, Mitigation, ObjectMeta, Relationship, RelationshipType,
    Software, StixObject, StixType, Tactic, Technique,
};
pub use resolver::{merge, resolve_related, RelatedObject, RelationshipMap};
pub use revocation::{remove_revoked_deprecated, Revocable};
pub use store::{EntityStore, Filter, MemoryStore};
