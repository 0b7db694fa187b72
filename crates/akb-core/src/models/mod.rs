//! Data models for the ATT&CK knowledge base.
//!
//! Raw store records, the closed type vocabularies, relationship edges, and
//! the typed views handed to callers.

pub mod object;
pub mod relationship;
pub mod types;
pub mod view;

pub use object::{ExternalReference, KillChainPhase, StixObject};
pub use relationship::{Direction, Relationship, RelationshipType};
pub use types::{Domain, StixType, RELATIONSHIP_TYPE_TAG};
pub use view::{
    AttackObject, Campaign, DataComponent, DataSource, Group, Matrix, Mitigation, ObjectMeta,
    Software, Tactic, Technique,
};
