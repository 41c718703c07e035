pub mod config;
pub mod diagnostics_layer;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, resolve_data_dir, validate, ConfigError};
pub use diagnostics_layer::DiagnosticsLayer;
pub use wiring::{wire_services, AppServices, WiringError};
