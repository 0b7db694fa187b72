//! Knowledge base error types.

use thiserror::Error;

/// Errors that can occur while loading or querying the knowledge base.
#[derive(Error, Debug)]
pub enum KnowledgeBaseError {
    /// A type, relationship or domain tag outside the recognized vocabulary.
    #[error("Invalid {kind} '{value}': must be one of [{allowed}]")]
    InvalidArgument {
        /// Which vocabulary was violated (e.g. "object type").
        kind: &'static str,
        /// The rejected value.
        value: String,
        /// Comma separated list of accepted values.
        allowed: String,
    },

    /// A lookup that requires a match found none.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bundle file could not be read.
    #[error("Failed to read bundle {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// The bundle contents are not a valid STIX bundle.
    #[error("Failed to parse bundle {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl KnowledgeBaseError {
    /// Builds an `InvalidArgument` error listing the allowed values.
    pub fn invalid_argument<I, T>(kind: &'static str, value: &str, allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let allowed = allowed
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self::InvalidArgument {
            kind,
            value: value.to_string(),
            allowed,
        }
    }

    /// Returns true for the hard not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for knowledge base operations.
pub type KnowledgeBaseResult<T> = Result<T, KnowledgeBaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_lists_allowed_values() {
        let err = KnowledgeBaseError::invalid_argument("domain", "pre-attack", ["a", "b"]);
        let message = err.to_string();
        assert!(message.contains("pre-attack"));
        assert!(message.contains("[a, b]"));
        assert!(message.contains("domain"));
    }

    #[test]
    fn test_not_found_display() {
        let err = KnowledgeBaseError::NotFound("intrusion-set named 'APT0'".to_string());
        assert!(err.is_not_found());
        assert!(err.to_string().contains("APT0"));
    }

    #[test]
    fn test_parse_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = KnowledgeBaseError::Parse {
            origin: "enterprise-attack.json".to_string(),
            source,
        };
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("enterprise-attack.json"));
    }
}
