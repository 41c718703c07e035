//! # Pure Data Module - Data Transfer Objects Only
//!
//! ## Responsibilities
//!
//! - Define configuration data structures
//! - Provide TOML → DTO mapping
//!
//! ## Prohibited
//!
//! - No validation logic (required values are checked by the bootstrap layer)
//! - No environment access
//!
//! Missing backend values are empty strings: that is a fact, not an error, at this layer.
//! Missing tunables take the documented defaults.

use std::path::PathBuf;

/// Application configuration DTO
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend service URL (may be empty)
    pub backend_url: String,

    /// Public API key sent with every backend request (may be empty)
    pub anon_key: String,

    /// Maximum deferred reconciliation attempts while navigation is not ready
    pub redirect_max_attempts: u32,

    /// Base delay of the deferred reconciliation backoff
    pub redirect_base_delay_ms: u64,

    /// Attempt budget for call-site retries (uploads, profile creation)
    pub retry_max_attempts: u32,

    pub retry_base_delay_ms: u64,

    pub retry_max_delay_ms: u64,

    /// Upper bound of the random jitter added to each retry delay
    pub retry_jitter_ms: u64,

    /// Diagnostics ring buffer capacity
    pub diagnostics_capacity: usize,

    /// Access tokens expiring within this window are refreshed on read
    pub refresh_margin_secs: u64,

    /// Data directory for the credential cache and log files (empty = platform default)
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            anon_key: String::new(),
            redirect_max_attempts: 5,
            redirect_base_delay_ms: 50,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 10_000,
            retry_jitter_ms: 100,
            diagnostics_capacity: 100,
            refresh_margin_secs: 60,
            data_dir: PathBuf::new(),
        }
    }
}

impl AppConfig {
    /// Create AppConfig from TOML value
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let str_at = |section: &str, key: &str| {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let int_at = |section: &str, key: &str| {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_integer())
        };
        let non_negative = |value: i64, key: &str| -> anyhow::Result<u64> {
            u64::try_from(value).map_err(|_| anyhow::anyhow!("{key} must not be negative"))
        };

        let mut config = Self {
            backend_url: str_at("backend", "url").unwrap_or_default(),
            anon_key: str_at("backend", "anon_key").unwrap_or_default(),
            data_dir: PathBuf::from(str_at("storage", "data_dir").unwrap_or_default()),
            ..defaults
        };

        if let Some(v) = int_at("guard", "redirect_max_attempts") {
            config.redirect_max_attempts =
                u32::try_from(non_negative(v, "guard.redirect_max_attempts")?)?;
        }
        if let Some(v) = int_at("guard", "redirect_base_delay_ms") {
            config.redirect_base_delay_ms = non_negative(v, "guard.redirect_base_delay_ms")?;
        }
        if let Some(v) = int_at("retry", "max_attempts") {
            config.retry_max_attempts = u32::try_from(non_negative(v, "retry.max_attempts")?)?;
        }
        if let Some(v) = int_at("retry", "base_delay_ms") {
            config.retry_base_delay_ms = non_negative(v, "retry.base_delay_ms")?;
        }
        if let Some(v) = int_at("retry", "max_delay_ms") {
            config.retry_max_delay_ms = non_negative(v, "retry.max_delay_ms")?;
        }
        if let Some(v) = int_at("retry", "jitter_ms") {
            config.retry_jitter_ms = non_negative(v, "retry.jitter_ms")?;
        }
        if let Some(v) = int_at("auth", "refresh_margin_secs") {
            config.refresh_margin_secs = non_negative(v, "auth.refresh_margin_secs")?;
        }
        if let Some(v) = int_at("diagnostics", "capacity") {
            config.diagnostics_capacity =
                usize::try_from(non_negative(v, "diagnostics.capacity")?)?;
        }

        Ok(config)
    }
}
