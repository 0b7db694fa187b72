//! Composite relationship queries.
//!
//! Every family has a full-mapping method and a `*_with_id` method. The
//! `*_with_id` forms compute the whole mapping and index it once, so callers
//! doing many single-key lookups should call the full mapping instead.
//!
//! Group families also pick up relationships of the campaigns attributed to
//! each group. Those bridged entries follow the group's direct entries.

use super::AttackKnowledgeBase;
use crate::models::{Direction, RelationshipType, StixType};
use crate::resolver::{merge, RelatedObject, RelationshipMap};
use crate::store::EntityStore;
use tracing::debug;

impl<S: EntityStore> AttackKnowledgeBase<S> {
    // ------------------------------------------------------------------
    // group <-> software
    // ------------------------------------------------------------------

    /// Group id to the software it uses, directly or through attributed
    /// campaigns.
    pub fn software_used_by_groups(&self) -> RelationshipMap {
        let direct = self.software_uses(|software| (StixType::Group, software), Direction::Forward);
        let bridged = bridge(
            &self.campaigns_attributed_to_groups(),
            &self.software_used_by_campaigns(),
        );
        let output = merge(direct, bridged);
        debug!(groups = output.len(), "Resolved software used by groups");
        output
    }

    pub fn software_used_by_group_with_id(&self, group_id: &str) -> Vec<RelatedObject> {
        take(self.software_used_by_groups(), group_id)
    }

    /// Software id to the groups using it, directly or through attributed
    /// campaigns.
    pub fn groups_using_software(&self) -> RelationshipMap {
        let direct = self.software_uses(|software| (StixType::Group, software), Direction::Reverse);
        let bridged = bridge(
            &self.campaigns_using_software(),
            &self.groups_attributing_to_campaigns(),
        );
        let output = merge(direct, bridged);
        debug!(software = output.len(), "Resolved groups using software");
        output
    }

    pub fn groups_using_software_with_id(&self, software_id: &str) -> Vec<RelatedObject> {
        take(self.groups_using_software(), software_id)
    }

    // ------------------------------------------------------------------
    // software <-> campaign
    // ------------------------------------------------------------------

    /// Campaign id to the software it uses.
    pub fn software_used_by_campaigns(&self) -> RelationshipMap {
        self.software_uses(|software| (StixType::Campaign, software), Direction::Forward)
    }

    pub fn software_used_by_campaign_with_id(&self, campaign_id: &str) -> Vec<RelatedObject> {
        take(self.software_used_by_campaigns(), campaign_id)
    }

    /// Software id to the campaigns using it.
    pub fn campaigns_using_software(&self) -> RelationshipMap {
        self.software_uses(|software| (StixType::Campaign, software), Direction::Reverse)
    }

    pub fn campaigns_using_software_with_id(&self, software_id: &str) -> Vec<RelatedObject> {
        take(self.campaigns_using_software(), software_id)
    }

    // ------------------------------------------------------------------
    // campaign <-> group
    // ------------------------------------------------------------------

    /// Campaign id to the groups it is attributed to.
    pub fn groups_attributing_to_campaigns(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Campaign,
            RelationshipType::AttributedTo,
            StixType::Group,
            Direction::Forward,
        )
    }

    pub fn groups_attributing_to_campaign_with_id(&self, campaign_id: &str) -> Vec<RelatedObject> {
        take(self.groups_attributing_to_campaigns(), campaign_id)
    }

    /// Group id to the campaigns attributed to it.
    pub fn campaigns_attributed_to_groups(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Campaign,
            RelationshipType::AttributedTo,
            StixType::Group,
            Direction::Reverse,
        )
    }

    pub fn campaigns_attributed_to_group_with_id(&self, group_id: &str) -> Vec<RelatedObject> {
        take(self.campaigns_attributed_to_groups(), group_id)
    }

    // ------------------------------------------------------------------
    // technique <-> group
    // ------------------------------------------------------------------

    /// Group id to the techniques it uses, directly or through attributed
    /// campaigns.
    pub fn techniques_used_by_groups(&self) -> RelationshipMap {
        let direct = self.resolve_related(
            StixType::Group,
            RelationshipType::Uses,
            StixType::Technique,
            Direction::Forward,
        );
        let bridged = bridge(
            &self.campaigns_attributed_to_groups(),
            &self.techniques_used_by_campaigns(),
        );
        let output = merge(direct, bridged);
        debug!(groups = output.len(), "Resolved techniques used by groups");
        output
    }

    pub fn techniques_used_by_group_with_id(&self, group_id: &str) -> Vec<RelatedObject> {
        take(self.techniques_used_by_groups(), group_id)
    }

    /// Technique id to the groups using it, directly or through attributed
    /// campaigns.
    pub fn groups_using_techniques(&self) -> RelationshipMap {
        let direct = self.resolve_related(
            StixType::Group,
            RelationshipType::Uses,
            StixType::Technique,
            Direction::Reverse,
        );
        let bridged = bridge(
            &self.campaigns_using_techniques(),
            &self.groups_attributing_to_campaigns(),
        );
        let output = merge(direct, bridged);
        debug!(techniques = output.len(), "Resolved groups using techniques");
        output
    }

    pub fn groups_using_technique_with_id(&self, technique_id: &str) -> Vec<RelatedObject> {
        take(self.groups_using_techniques(), technique_id)
    }

    // ------------------------------------------------------------------
    // technique <-> campaign
    // ------------------------------------------------------------------

    /// Campaign id to the techniques it uses.
    pub fn techniques_used_by_campaigns(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Campaign,
            RelationshipType::Uses,
            StixType::Technique,
            Direction::Forward,
        )
    }

    pub fn techniques_used_by_campaign_with_id(&self, campaign_id: &str) -> Vec<RelatedObject> {
        take(self.techniques_used_by_campaigns(), campaign_id)
    }

    /// Technique id to the campaigns using it.
    pub fn campaigns_using_techniques(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Campaign,
            RelationshipType::Uses,
            StixType::Technique,
            Direction::Reverse,
        )
    }

    pub fn campaigns_using_technique_with_id(&self, technique_id: &str) -> Vec<RelatedObject> {
        take(self.campaigns_using_techniques(), technique_id)
    }

    // ------------------------------------------------------------------
    // technique <-> software
    // ------------------------------------------------------------------

    /// Software id to the techniques it uses.
    pub fn techniques_used_by_software(&self) -> RelationshipMap {
        self.software_uses(|software| (software, StixType::Technique), Direction::Forward)
    }

    pub fn techniques_used_by_software_with_id(&self, software_id: &str) -> Vec<RelatedObject> {
        take(self.techniques_used_by_software(), software_id)
    }

    /// Technique id to the software using it, tools before malware.
    pub fn software_using_techniques(&self) -> RelationshipMap {
        self.software_uses(|software| (software, StixType::Technique), Direction::Reverse)
    }

    pub fn software_using_technique_with_id(&self, technique_id: &str) -> Vec<RelatedObject> {
        take(self.software_using_techniques(), technique_id)
    }

    // ------------------------------------------------------------------
    // technique <-> mitigation
    // ------------------------------------------------------------------

    /// Mitigation id to the techniques it mitigates.
    pub fn techniques_mitigated_by_mitigations(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Mitigation,
            RelationshipType::Mitigates,
            StixType::Technique,
            Direction::Forward,
        )
    }

    pub fn techniques_mitigated_by_mitigation_with_id(
        &self,
        mitigation_id: &str,
    ) -> Vec<RelatedObject> {
        take(self.techniques_mitigated_by_mitigations(), mitigation_id)
    }

    /// Technique id to the mitigations for it.
    pub fn mitigations_mitigating_techniques(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Mitigation,
            RelationshipType::Mitigates,
            StixType::Technique,
            Direction::Reverse,
        )
    }

    pub fn mitigations_mitigating_technique_with_id(
        &self,
        technique_id: &str,
    ) -> Vec<RelatedObject> {
        take(self.mitigations_mitigating_techniques(), technique_id)
    }

    // ------------------------------------------------------------------
    // technique <-> subtechnique
    // ------------------------------------------------------------------

    /// Sub-technique id to its parent technique.
    pub fn parent_techniques_of_subtechniques(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Technique,
            RelationshipType::SubtechniqueOf,
            StixType::Technique,
            Direction::Forward,
        )
    }

    pub fn parent_technique_of_subtechnique_with_id(
        &self,
        subtechnique_id: &str,
    ) -> Vec<RelatedObject> {
        take(self.parent_techniques_of_subtechniques(), subtechnique_id)
    }

    /// Technique id to its sub-techniques.
    pub fn subtechniques_of_techniques(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::Technique,
            RelationshipType::SubtechniqueOf,
            StixType::Technique,
            Direction::Reverse,
        )
    }

    pub fn subtechniques_of_technique_with_id(&self, technique_id: &str) -> Vec<RelatedObject> {
        take(self.subtechniques_of_techniques(), technique_id)
    }

    // ------------------------------------------------------------------
    // technique <-> data component
    // ------------------------------------------------------------------

    /// Data component id to the techniques it detects.
    pub fn techniques_detected_by_datacomponents(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::DataComponent,
            RelationshipType::Detects,
            StixType::Technique,
            Direction::Forward,
        )
    }

    pub fn techniques_detected_by_datacomponent_with_id(
        &self,
        datacomponent_id: &str,
    ) -> Vec<RelatedObject> {
        take(self.techniques_detected_by_datacomponents(), datacomponent_id)
    }

    /// Technique id to the data components detecting it.
    pub fn datacomponents_detecting_techniques(&self) -> RelationshipMap {
        self.resolve_related(
            StixType::DataComponent,
            RelationshipType::Detects,
            StixType::Technique,
            Direction::Reverse,
        )
    }

    pub fn datacomponents_detecting_technique_with_id(
        &self,
        technique_id: &str,
    ) -> Vec<RelatedObject> {
        take(self.datacomponents_detecting_techniques(), technique_id)
    }

    /// Resolves a `uses` edge once per software type and merges the results,
    /// tools first. `endpoints` maps a software type to the edge's
    /// `(source, target)` types.
    fn software_uses(
        &self,
        endpoints: impl Fn(StixType) -> (StixType, StixType),
        direction: Direction,
    ) -> RelationshipMap {
        StixType::SOFTWARE
            .into_iter()
            .map(|software| {
                let (source, target) = endpoints(software);
                self.resolve_related(source, RelationshipType::Uses, target, direction)
            })
            .fold(RelationshipMap::new(), merge)
    }
}

/// Collapses `anchor -> bridge -> related` into `anchor -> related`.
///
/// For each anchor the related lists of its bridging objects are
/// concatenated in bridge order. A bridging object with no entry in
/// `bridge_to_related` contributes nothing, and anchors with no
/// contribution are left out.
fn bridge(
    anchor_to_bridge: &RelationshipMap,
    bridge_to_related: &RelationshipMap,
) -> RelationshipMap {
    let mut output = RelationshipMap::new();
    for (anchor, bridges) in anchor_to_bridge {
        let related: Vec<RelatedObject> = bridges
            .iter()
            .filter_map(|b| bridge_to_related.get(b.object.id()))
            .flatten()
            .cloned()
            .collect();
        if !related.is_empty() {
            output.insert(anchor.clone(), related);
        }
    }
    output
}

fn take(mut map: RelationshipMap, key: &str) -> Vec<RelatedObject> {
    map.remove(key).unwrap_or_default()
}
