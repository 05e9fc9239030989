//! Configuration loader for the cat simulator.
//!
//! Reads `config.toml` from the data directory (`~/.catsim/` by default)
//! and deserializes it into [`CatsimConfig`]. Falls back to defaults when
//! the file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use catsim_types::config::{CatsimConfig, ModelProvider};
use catsim_types::error::ConfigError;

use crate::sqlite::pool::default_database_url;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `CATSIM_DATA_DIR` environment variable
/// 2. `~/.catsim` in the user's home directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CATSIM_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".catsim");
    }

    // Last resort: current directory
    PathBuf::from(".catsim")
}

/// Load configuration from `{data_dir}/config.toml` and the process
/// environment, then validate it.
///
/// A missing or unparseable file is not an error; an invalid table name or
/// override value is.
pub async fn load_config(data_dir: &Path) -> Result<CatsimConfig, ConfigError> {
    let mut config = load_file_config(data_dir).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Read `config.toml`, logging and defaulting on any failure.
pub async fn load_file_config(data_dir: &Path) -> CatsimConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return CatsimConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return CatsimConfig::default();
        }
    };

    match toml::from_str::<CatsimConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            CatsimConfig::default()
        }
    }
}

/// Apply environment overrides through `lookup`.
///
/// Takes a lookup function instead of reading the process environment so
/// tests stay independent of it.
pub fn apply_env_overrides<F>(config: &mut CatsimConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup("CHAT_TABLE_NAME") {
        config.table_name = name;
    }
    if let Some(url) = lookup("CATSIM_DATABASE_URL") {
        config.database_url = Some(url);
    }
    if let Some(raw) = lookup("CATSIM_SWEEP_INTERVAL_SECS") {
        config.sweep_interval_secs =
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "CATSIM_SWEEP_INTERVAL_SECS".to_string(),
                    message: format!("expected a number of seconds, got '{raw}'"),
                })?;
    }
    if let Some(raw) = lookup("CATSIM_ALLOW_EMPTY_MESSAGE") {
        config.allow_empty_message = match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" | "" => false,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "CATSIM_ALLOW_EMPTY_MESSAGE".to_string(),
                    message: format!("expected true or false, got '{raw}'"),
                });
            }
        };
    }
    if let Some(raw) = lookup("CATSIM_MODEL_PROVIDER") {
        config.model.provider =
            raw.parse::<ModelProvider>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "CATSIM_MODEL_PROVIDER".to_string(),
                    message,
                })?;
    }
    if let Some(model) = lookup("CATSIM_MODEL") {
        config.model.model = model;
    }
    if let Some(region) = lookup("CATSIM_MODEL_REGION") {
        config.model.region = region;
    }
    if let Some(prompt) = lookup("CATSIM_SYSTEM_PROMPT") {
        config.model.system_prompt = Some(prompt);
    }
    Ok(())
}

/// The database URL to connect to: the configured one, or `catsim.db` in
/// the data directory.
pub fn database_url(config: &CatsimConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}
