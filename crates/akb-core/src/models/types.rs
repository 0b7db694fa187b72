//! Closed vocabularies of the knowledge base: object types and domains.

use crate::error::KnowledgeBaseError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// STIX `type` of relationship records.
pub const RELATIONSHIP_TYPE_TAG: &str = "relationship";

/// Entity types recognized by the knowledge base.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StixType {
    /// A technique or sub-technique.
    #[serde(rename = "attack-pattern")]
    Technique,
    /// Malicious software.
    #[serde(rename = "malware")]
    Malware,
    /// Legitimate software abused by adversaries.
    #[serde(rename = "tool")]
    Tool,
    /// An adversary group.
    #[serde(rename = "intrusion-set")]
    Group,
    /// A campaign.
    #[serde(rename = "campaign")]
    Campaign,
    /// A mitigation.
    #[serde(rename = "course-of-action")]
    Mitigation,
    /// A matrix.
    #[serde(rename = "x-mitre-matrix")]
    Matrix,
    /// A tactic.
    #[serde(rename = "x-mitre-tactic")]
    Tactic,
    /// A data source.
    #[serde(rename = "x-mitre-data-source")]
    DataSource,
    /// A data component.
    #[serde(rename = "x-mitre-data-component")]
    DataComponent,
}

impl StixType {
    /// Every recognized type, in canonical order.
    pub const ALL: [StixType; 10] = [
        StixType::Technique,
        StixType::Malware,
        StixType::Tool,
        StixType::Group,
        StixType::Campaign,
        StixType::Mitigation,
        StixType::Matrix,
        StixType::Tactic,
        StixType::DataSource,
        StixType::DataComponent,
    ];

    /// Software is either a tool or malware.
    pub const SOFTWARE: [StixType; 2] = [StixType::Tool, StixType::Malware];

    /// Returns the STIX type tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            StixType::Technique => "attack-pattern",
            StixType::Malware => "malware",
            StixType::Tool => "tool",
            StixType::Group => "intrusion-set",
            StixType::Campaign => "campaign",
            StixType::Mitigation => "course-of-action",
            StixType::Matrix => "x-mitre-matrix",
            StixType::Tactic => "x-mitre-tactic",
            StixType::DataSource => "x-mitre-data-source",
            StixType::DataComponent => "x-mitre-data-component",
        }
    }

    /// Returns true for tools and malware.
    pub fn is_software(&self) -> bool {
        matches!(self, StixType::Tool | StixType::Malware)
    }

    /// Derives the type from a `<type>--<uuid>` identifier prefix.
    ///
    /// Returns `None` when the prefix is not a recognized type, including
    /// relationship identifiers.
    pub fn from_stix_id(stix_id: &str) -> Option<Self> {
        let (prefix, _) = stix_id.split_once("--")?;
        prefix.parse().ok()
    }
}

impl std::fmt::Display for StixType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StixType {
    type Err = KnowledgeBaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StixType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                KnowledgeBaseError::invalid_argument(
                    "object type",
                    s,
                    StixType::ALL.iter().map(StixType::as_str),
                )
            })
    }
}

/// ATT&CK domains, each with its own kill chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Domain {
    /// Enterprise ATT&CK.
    #[serde(rename = "enterprise-attack")]
    Enterprise,
    /// Mobile ATT&CK.
    #[serde(rename = "mobile-attack")]
    Mobile,
    /// ATT&CK for ICS.
    #[serde(rename = "ics-attack")]
    Ics,
}

impl Domain {
    /// Every recognized domain.
    pub const ALL: [Domain; 3] = [Domain::Enterprise, Domain::Mobile, Domain::Ics];

    /// Returns the domain tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Enterprise => "enterprise-attack",
            Domain::Mobile => "mobile-attack",
            Domain::Ics => "ics-attack",
        }
    }

    /// Returns the `kill_chain_name` techniques of this domain use.
    pub fn kill_chain_name(&self) -> &'static str {
        match self {
            Domain::Enterprise => "mitre-attack",
            Domain::Mobile => "mitre-mobile-attack",
            Domain::Ics => "mitre-ics-attack",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Domain {
    type Err = KnowledgeBaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| {
                KnowledgeBaseError::invalid_argument(
                    "domain",
                    s,
                    Domain::ALL.iter().map(Domain::as_str),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stix_type_round_trips_through_tag() {
        for stix_type in StixType::ALL {
            assert_eq!(stix_type.as_str().parse::<StixType>().unwrap(), stix_type);
        }
    }

    #[test]
    fn test_stix_type_rejects_unknown_tag() {
        let err = "identity".parse::<StixType>().unwrap_err();
        assert!(matches!(err, KnowledgeBaseError::InvalidArgument { .. }));
        assert!(err.to_string().contains("x-mitre-data-component"));
    }

    #[test]
    fn test_from_stix_id() {
        assert_eq!(
            StixType::from_stix_id("attack-pattern--0a3ead4e-6d47-4ccb-854c-a6a4f9d96b22"),
            Some(StixType::Technique)
        );
        assert_eq!(
            StixType::from_stix_id("x-mitre-data-component--3d20385b-24ef-40e1-9f56-f39750379077"),
            Some(StixType::DataComponent)
        );
        assert_eq!(
            StixType::from_stix_id("relationship--0a3ead4e-6d47-4ccb-854c-a6a4f9d96b22"),
            None
        );
        assert_eq!(StixType::from_stix_id("no-separator"), None);
    }

    #[test]
    fn test_prefix_is_not_a_substring_match() {
        // "tool" appears inside other ids but only the prefix counts
        assert_eq!(StixType::from_stix_id("x-mitre-tool--abc"), None);
    }

    #[test]
    fn test_software_types() {
        assert!(StixType::Tool.is_software());
        assert!(StixType::Malware.is_software());
        assert!(!StixType::Group.is_software());
    }

    #[test]
    fn test_domain_kill_chains() {
        assert_eq!(Domain::Enterprise.kill_chain_name(), "mitre-attack");
        assert_eq!(Domain::Mobile.kill_chain_name(), "mitre-mobile-attack");
        assert_eq!(Domain::Ics.kill_chain_name(), "mitre-ics-attack");
        assert_eq!("ics-attack".parse::<Domain>().unwrap(), Domain::Ics);
        assert!("pre-attack".parse::<Domain>().is_err());
    }

    #[test]
    fn test_type_display() {
        assert_eq!(format!("{}", StixType::Group), "intrusion-set");
        assert_eq!(format!("{}", Domain::Mobile), "mobile-attack");
    }
}
