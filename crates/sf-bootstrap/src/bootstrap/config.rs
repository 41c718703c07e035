//! # Configuration Loader
//!
//! ## Responsibilities
//!
//! - Read the TOML configuration file when it exists
//! - Load `.env` and let the environment override the backend coordinates
//! - Decide, in `validate`, whether the result is usable
//!
//! Loading never rejects a value; empty backend settings only become an error in
//! `validate`, which callers run before anything talks to the network.

use std::path::{Path, PathBuf};

use anyhow::Context;
use sf_core::config::AppConfig;
use thiserror::Error;

/// Environment variables for the backend URL, highest precedence first.
pub const BACKEND_URL_VARS: [&str; 2] = ["SNAPFEED_SUPABASE_URL", "EXPO_PUBLIC_SUPABASE_URL"];

/// Environment variables for the public API key, highest precedence first.
pub const ANON_KEY_VARS: [&str; 2] = ["SNAPFEED_SUPABASE_ANON_KEY", "EXPO_PUBLIC_SUPABASE_ANON_KEY"];

const APP_DIR_NAME: &str = "snapfeed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing backend URL: set [backend] url or SNAPFEED_SUPABASE_URL")]
    MissingBackendUrl,

    #[error("Missing backend anon key: set [backend] anon_key or SNAPFEED_SUPABASE_ANON_KEY")]
    MissingAnonKey,

    #[error("auth.refresh_margin_secs must be at most {MAX_REFRESH_MARGIN_SECS} (got {0})")]
    RefreshMarginTooLarge(u64),
}

/// Tokens live for an hour; a margin beyond a day would refresh on every read.
pub const MAX_REFRESH_MARGIN_SECS: u64 = 86_400;

/// Load configuration from `config_path` (optional) and the process environment.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    // A missing .env is the normal case outside development.
    let _ = dotenvy::dotenv();

    let mut config = read_config_file(config_path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Parse the TOML file, or return defaults when it does not exist.
pub fn read_config_file(config_path: &Path) -> anyhow::Result<AppConfig> {
    if !config_path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))
}

/// Overlay backend settings found through `lookup`. Blank variables are ignored.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let first_set = |keys: &[&str]| {
        keys.iter()
            .find_map(|key| lookup(key).filter(|value| !value.trim().is_empty()))
    };

    if let Some(url) = first_set(&BACKEND_URL_VARS) {
        config.backend_url = url.trim().to_string();
    }
    if let Some(key) = first_set(&ANON_KEY_VARS) {
        config.anon_key = key.trim().to_string();
    }
}

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.backend_url.trim().is_empty() {
        return Err(ConfigError::MissingBackendUrl);
    }
    if config.anon_key.trim().is_empty() {
        return Err(ConfigError::MissingAnonKey);
    }
    if config.refresh_margin_secs > MAX_REFRESH_MARGIN_SECS {
        return Err(ConfigError::RefreshMarginTooLarge(config.refresh_margin_secs));
    }
    Ok(())
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Configured data directory, or the platform default when unset.
pub fn resolve_data_dir(config: &AppConfig) -> PathBuf {
    if config.data_dir.as_os_str().is_empty() {
        default_data_dir()
    } else {
        config.data_dir.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_read_config_file_parses_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(
                br#"
                [backend]
                url = "https://demo.supabase.co"
                anon_key = "anon"

                [retry]
                max_attempts = 5
                "#,
            )
            .unwrap();

        let config = read_config_file(temp_file.path()).unwrap();

        assert_eq!(config.backend_url, "https://demo.supabase.co");
        assert_eq!(config.anon_key, "anon");
        assert_eq!(config.retry_max_attempts, 5);
        assert_eq!(config.redirect_max_attempts, 5);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = read_config_file(Path::new("/this/path/does/not/exist/config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[backend\nurl = ").unwrap();

        let err = read_config_file(temp_file.path()).unwrap_err();

        assert!(err.to_string().contains("TOML"), "got: {err}");
    }

    #[test]
    fn test_env_overrides_prefer_snapfeed_variables() {
        let mut config = AppConfig {
            backend_url: "https://from-file".to_string(),
            ..AppConfig::default()
        };

        apply_env_overrides(
            &mut config,
            env(&[
                ("EXPO_PUBLIC_SUPABASE_URL", "https://expo"),
                ("SNAPFEED_SUPABASE_URL", "https://snapfeed"),
                ("EXPO_PUBLIC_SUPABASE_ANON_KEY", " expo-key "),
            ]),
        );

        assert_eq!(config.backend_url, "https://snapfeed");
        assert_eq!(config.anon_key, "expo-key");
    }

    #[test]
    fn test_blank_env_values_do_not_override() {
        let mut config = AppConfig {
            anon_key: "file-key".to_string(),
            ..AppConfig::default()
        };

        apply_env_overrides(&mut config, env(&[("SNAPFEED_SUPABASE_ANON_KEY", "  ")]));

        assert_eq!(config.anon_key, "file-key");
    }

    #[test]
    fn test_validate_requires_url_then_key() {
        let mut config = AppConfig::default();
        assert_eq!(validate(&config), Err(ConfigError::MissingBackendUrl));

        config.backend_url = "https://demo.supabase.co".to_string();
        assert_eq!(validate(&config), Err(ConfigError::MissingAnonKey));

        config.anon_key = "anon".to_string();
        assert_eq!(validate(&config), Ok(()));
    }

    #[test]
    fn test_validate_bounds_refresh_margin() {
        let mut config = AppConfig {
            backend_url: "https://demo.supabase.co".to_string(),
            anon_key: "anon".to_string(),
            refresh_margin_secs: MAX_REFRESH_MARGIN_SECS,
            ..AppConfig::default()
        };
        assert_eq!(validate(&config), Ok(()));

        config.refresh_margin_secs += 1;
        assert_eq!(
            validate(&config),
            Err(ConfigError::RefreshMarginTooLarge(MAX_REFRESH_MARGIN_SECS + 1))
        );
    }

    #[test]
    fn test_resolve_data_dir_falls_back_to_platform_default() {
        let config = AppConfig::default();
        assert!(resolve_data_dir(&config).ends_with("snapfeed"));

        let config = AppConfig {
            data_dir: PathBuf::from("/tmp/sf"),
            ..AppConfig::default()
        };
        assert_eq!(resolve_data_dir(&config), PathBuf::from("/tmp/sf"));
    }
}
