//! Revocation and deprecation filtering.

use crate::models::{AttackObject, Relationship, StixObject};
use crate::resolver::RelatedObject;

/// Something that can be revoked or deprecated.
pub trait Revocable {
    fn is_revoked(&self) -> bool;

    fn is_deprecated(&self) -> bool;

    /// Returns true if either flag is set.
    fn is_revoked_or_deprecated(&self) -> bool {
        self.is_revoked() || self.is_deprecated()
    }
}

impl Revocable for StixObject {
    fn is_revoked(&self) -> bool {
        self.revoked.unwrap_or(false)
    }

    fn is_deprecated(&self) -> bool {
        self.x_mitre_deprecated.unwrap_or(false)
    }
}

impl Revocable for Relationship {
    fn is_revoked(&self) -> bool {
        self.revoked
    }

    fn is_deprecated(&self) -> bool {
        self.deprecated
    }
}

impl Revocable for AttackObject {
    fn is_revoked(&self) -> bool {
        match self {
            AttackObject::Relationship(r) => r.revoked,
            _ => self.meta().is_some_and(|m| m.revoked),
        }
    }

    fn is_deprecated(&self) -> bool {
        match self {
            AttackObject::Relationship(r) => r.deprecated,
            _ => self.meta().is_some_and(|m| m.deprecated),
        }
    }
}

/// A related pair is stale when either the object or the edge is.
impl Revocable for RelatedObject {
    fn is_revoked(&self) -> bool {
        self.object.is_revoked() || self.relationship.is_revoked()
    }

    fn is_deprecated(&self) -> bool {
        self.object.is_deprecated() || self.relationship.is_deprecated()
    }
}

impl<T: Revocable + ?Sized> Revocable for &T {
    fn is_revoked(&self) -> bool {
        (**self).is_revoked()
    }

    fn is_deprecated(&self) -> bool {
        (**self).is_deprecated()
    }
}

/// Removes revoked or deprecated items, keeping the order of the rest.
pub fn remove_revoked_deprecated<I, T>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Revocable,
{
    items
        .into_iter()
        .filter(|item| !item.is_revoked_or_deprecated())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RelationshipType;

    fn record(id: &str, revoked: Option<bool>, deprecated: Option<bool>) -> StixObject {
        let mut record = StixObject::new(id, "attack-pattern");
        record.revoked = revoked;
        record.x_mitre_deprecated = deprecated;
        record
    }

    #[test]
    fn test_absent_flags_mean_current() {
        let kept = remove_revoked_deprecated(vec![record("attack-pattern--1", None, None)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_removes_revoked_and_deprecated_preserving_order() {
        let records = vec![
            record("attack-pattern--1", None, None),
            record("attack-pattern--2", Some(true), None),
            record("attack-pattern--3", Some(false), Some(false)),
            record("attack-pattern--4", None, Some(true)),
            record("attack-pattern--5", Some(false), None),
        ];

        let kept: Vec<_> = remove_revoked_deprecated(&records)
            .into_iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(
            kept,
            vec!["attack-pattern--1", "attack-pattern--3", "attack-pattern--5"]
        );
    }

    #[test]
    fn test_typed_views_and_relationships() {
        let object = AttackObject::from_record(&record("attack-pattern--1", None, Some(true)))
            .unwrap();
        assert!(object.is_deprecated());
        assert!(!object.is_revoked());

        let mut rel = Relationship::new(
            "relationship--1",
            "course-of-action--1",
            RelationshipType::Mitigates,
            "attack-pattern--1",
        );
        assert!(!rel.is_revoked_or_deprecated());
        rel.revoked = true;
        assert!(rel.is_revoked_or_deprecated());
        assert!(AttackObject::Relationship(rel).is_revoked());
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<StixObject> = Vec::new();
        assert!(remove_revoked_deprecated(empty).is_empty());
    }
}
