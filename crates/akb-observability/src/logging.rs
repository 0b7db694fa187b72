//! Logging infrastructure for the knowledge base.
//!
//! This module installs a `tracing` subscriber with an environment filter and
//! either human readable or JSON output.

use akb_core::config::{KnowledgeBaseConfig, LoggingSettings};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Crates whose events the default filter lets through.
const CRATE_TARGETS: [&str; 2] = ["akb_core", "akb_observability"];

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level.
    pub level: Level,
    /// Whether to use JSON format.
    pub json_format: bool,
    /// Whether to include span events.
    pub include_spans: bool,
    /// Whether to include file/line info.
    pub include_location: bool,
    /// Whether to include target (module path).
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_spans: false,
            include_location: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Verbose output with resolver spans and source locations.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            json_format: false,
            include_spans: true,
            include_location: true,
            include_target: true,
        }
    }

    /// JSON lines for log aggregation.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            include_spans: false,
            include_location: false,
            include_target: true,
        }
    }

    /// Builds a configuration from the YAML `logging` section.
    ///
    /// An unparseable level falls back to `INFO`.
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            level: settings.level.parse().unwrap_or(Level::INFO),
            json_format: settings.json_format,
            ..Self::default()
        }
    }

    /// Filter directives used when `RUST_LOG` is not set.
    pub fn default_directives(&self) -> String {
        CRATE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Initializes the logging system with default configuration.
pub fn init_logging() -> Result<(), TryInitError> {
    init_logging_with_config(LoggingConfig::default())
}

/// Initializes logging from a loaded knowledge base configuration.
pub fn init_from_config(config: &KnowledgeBaseConfig) -> Result<(), TryInitError> {
    init_logging_with_config(LoggingConfig::from_settings(&config.logging))
}

/// Initializes the logging system with the given configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(span_events)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    }
}

/// Creates a span around a knowledge base query.
#[macro_export]
macro_rules! kb_span {
    ($query:expr) => {
        tracing::info_span!("kb_query", query = %$query)
    };
    ($query:expr, $($field:tt)*) => {
        tracing::info_span!("kb_query", query = %$query, $($field)*)
    };
}
