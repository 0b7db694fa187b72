//! One-hop relationship resolution.
//!
//! [`resolve_related`] turns the flat edge list into an adjacency mapping
//! between two entity types, and [`merge`] appends one mapping onto another.
//! Multi-hop queries in [`crate::knowledge_base`] are built from these two.

use crate::models::{AttackObject, Direction, Relationship, RelationshipType, StixObject, StixType};
use crate::revocation::remove_revoked_deprecated;
use crate::store::{EntityStore, Filter};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument, trace};

/// A related object together with the edge that relates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedObject {
    pub object: AttackObject,
    pub relationship: Relationship,
}

/// Anchor id to its related objects, in edge order.
///
/// Anchors with no valid related object are absent rather than mapped to an
/// empty list.
pub type RelationshipMap = HashMap<String, Vec<RelatedObject>>;

/// Builds the mapping for edges `source_type -[relationship_type]-> target_type`.
///
/// With [`Direction::Forward`] the mapping is keyed by source id and lists
/// targets; with [`Direction::Reverse`] it is keyed by target id and lists
/// sources. Revoked or deprecated edges are ignored, and pairs whose related
/// object is revoked or missing from the store are dropped.
#[instrument(skip(store), level = "debug")]
pub fn resolve_related<S>(
    store: &S,
    source_type: StixType,
    relationship_type: RelationshipType,
    target_type: StixType,
    direction: Direction,
) -> RelationshipMap
where
    S: EntityStore + ?Sized,
{
    let edges = remove_revoked_deprecated(store.query(&[
        Filter::IsRelationship,
        Filter::RelationshipType(relationship_type),
        Filter::NotRevoked,
    ]));

    let mut pending: HashMap<String, Vec<(Relationship, String)>> = HashMap::new();
    for edge in edges {
        let Some(relationship) = Relationship::from_record(edge) else {
            continue;
        };
        if !relationship.connects(source_type, target_type) {
            continue;
        }
        let (anchor, related) = relationship.endpoints(direction);
        let (anchor, related) = (anchor.to_string(), related.to_string());
        pending.entry(anchor).or_default().push((relationship, related));
    }

    let related_type = match direction {
        Direction::Forward => target_type,
        Direction::Reverse => source_type,
    };
    let candidates: HashMap<&str, &StixObject> = store
        .query(&[Filter::Type(related_type), Filter::NotRevoked])
        .into_iter()
        .map(|record| (record.id.as_str(), record))
        .collect();

    let mut output = RelationshipMap::with_capacity(pending.len());
    for (anchor, pairs) in pending {
        let related: Vec<RelatedObject> = pairs
            .into_iter()
            .filter_map(|(relationship, related_id)| {
                let Some(record) = candidates.get(related_id.as_str()) else {
                    trace!(
                        relationship = %relationship.id,
                        related = %related_id,
                        "Dropping edge to revoked or missing object"
                    );
                    return None;
                };
                AttackObject::from_record(record).map(|object| RelatedObject {
                    object,
                    relationship,
                })
            })
            .collect();
        if !related.is_empty() {
            output.insert(anchor, related);
        }
    }

    debug!(anchors = output.len(), "Resolved relationship mapping");
    output
}

/// Appends every list of `map_b` onto the list for the same key in `map_a`.
///
/// Entries already in `map_a` come first. Pairs are not deduplicated: two
/// edges between the same objects are two facts.
pub fn merge(mut map_a: RelationshipMap, map_b: RelationshipMap) -> RelationshipMap {
    for (id, related) in map_b {
        map_a.entry(id).or_default().extend(related);
    }
    map_a
}
