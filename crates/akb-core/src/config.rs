//! YAML configuration loader for the knowledge base.
//!
//! Loads the bundle location, the ATT&CK id namespace and logging settings.
//! `${VAR}` references are replaced from the environment before parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Top-level knowledge base configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Path to the STIX 2.0 bundle file.
    pub bundle_path: PathBuf,
    /// External-reference source name that carries ATT&CK ids.
    #[serde(default = "default_source_name")]
    pub source_name: String,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl KnowledgeBaseConfig {
    /// Configuration for a bundle with default settings.
    pub fn new(bundle_path: impl Into<PathBuf>) -> Self {
        Self {
            bundle_path: bundle_path.into(),
            source_name: default_source_name(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Logging section of the configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level: trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_source_name() -> String {
    crate::knowledge_base::DEFAULT_SOURCE_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Substitutes `${VAR}` references with environment values.
fn substitute_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex for env vars");
    let mut result = input.to_string();
    let mut missing = Vec::new();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        match env::var(var_name) {
            Ok(value) => result = result.replace(&cap[0], &value),
            Err(_) => missing.push(var_name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(ConfigError::EnvVarNotFound(missing.join(", ")));
    }

    Ok(result)
}

/// Loads and validates a configuration file.
///
/// # Example
/// ```no_run
/// use akb_core::config::load_config;
///
/// let config = load_config("config/knowledge_base.yaml").unwrap();
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<KnowledgeBaseConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let content = substitute_env_vars(&content)?;
    let config: KnowledgeBaseConfig = serde_yaml::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates a loaded configuration.
pub fn validate_config(config: &KnowledgeBaseConfig) -> Result<(), ConfigError> {
    if config.bundle_path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidValue(
            "bundle_path must not be empty".to_string(),
        ));
    }

    if config.source_name.trim().is_empty() {
        return Err(ConfigError::InvalidValue(
            "source_name must not be empty".to_string(),
        ));
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::InvalidValue(format!(
            "logging.level '{}' must be one of [{}]",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
bundle_path: /data/enterprise-attack.json
source_name: mitre-attack
logging:
  level: debug
  json_format: true
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.bundle_path, PathBuf::from("/data/enterprise-attack.json"));
        assert_eq!(config.source_name, "mitre-attack");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_defaults() {
        let file = write_config("bundle_path: ics-attack.json\n");

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.source_name, "mitre-attack");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);

        let built = KnowledgeBaseConfig::new("ics-attack.json");
        assert_eq!(built.source_name, config.source_name);
        assert!(validate_config(&built).is_ok());
    }

    #[test]
    fn test_missing_bundle_path() {
        let file = write_config("source_name: mitre-attack\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/knowledge_base.yaml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_invalid_values() {
        let mut config = KnowledgeBaseConfig::new("");
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue(_))
        ));

        config.bundle_path = PathBuf::from("enterprise-attack.json");
        config.source_name = "  ".to_string();
        assert!(validate_config(&config).is_err());

        config.source_name = "mitre-attack".to_string();
        config.logging.level = "verbose".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("verbose"));

        config.logging.level = "WARN".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_env_var_substitution_in_file() {
        env::set_var("AKB_TEST_BUNDLE_DIR", "/srv/attack");
        let file = write_config("bundle_path: ${AKB_TEST_BUNDLE_DIR}/mobile-attack.json\n");

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.bundle_path,
            PathBuf::from("/srv/attack/mobile-attack.json")
        );

        env::remove_var("AKB_TEST_BUNDLE_DIR");
    }

    #[test]
    fn test_substitute_env_vars() {
        env::set_var("AKB_TEST_VAR1", "value1");
        env::set_var("AKB_TEST_VAR2", "value2");

        let input = "prefix_${AKB_TEST_VAR1}_middle_${AKB_TEST_VAR2}_suffix";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "prefix_value1_middle_value2_suffix");

        env::remove_var("AKB_TEST_VAR1");
        env::remove_var("AKB_TEST_VAR2");
    }

    #[test]
    fn test_missing_env_var() {
        let err = substitute_env_vars("${AKB_TEST_DEFINITELY_UNSET}").unwrap_err();
        match err {
            ConfigError::EnvVarNotFound(name) => assert_eq!(name, "AKB_TEST_DEFINITELY_UNSET"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
