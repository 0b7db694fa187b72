//! # akb-observability
//!
//! Logging setup for the ATT&CK knowledge base.
//!
//! `akb-core` emits `tracing` events while loading bundles and resolving
//! relationships; this crate installs the subscriber that prints them.

pub mod logging;

pub use logging::{init_from_config, init_logging, init_logging_with_config, LoggingConfig};
