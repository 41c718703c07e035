//! # sf-bootstrap
//!
//! Startup layer for Snapfeed.
//!
//! - **bootstrap::config**: TOML + environment configuration and validation
//! - **bootstrap::tracing**: global subscriber (stderr, file, Sentry, diagnostics buffer)
//! - **bootstrap::wiring**: adapters assembled into the guard and use cases

pub mod bootstrap;

pub use bootstrap::{load_config, validate, wire_services, AppServices, ConfigError};
