//! Configuration types for the cat simulator.
//!
//! `CatsimConfig` represents the top-level `config.toml`. Every field has a
//! default, so an empty file (or no file) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Top-level configuration.
///
/// Loaded from `~/.catsim/config.toml`; environment variables override it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatsimConfig {
    /// Name of the durable conversation table.
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// sqlx database URL. When absent, a file in the data directory is used.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Accept chat turns whose text is empty.
    #[serde(default)]
    pub allow_empty_message: bool,

    /// Language-model collaborator settings.
    #[serde(default)]
    pub model: ModelConfig,
}

fn default_table_name() -> String {
    "catsim-chat".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for CatsimConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            database_url: None,
            sweep_interval_secs: default_sweep_interval_secs(),
            allow_empty_message: false,
            model: ModelConfig::default(),
        }
    }
}

impl CatsimConfig {
    /// Check the settings that cannot be defaulted away.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_table_name(&self.table_name)?;
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "sweep_interval_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Which language-model adapter answers chat turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Offline cat that needs no credentials.
    #[default]
    Meow,
    /// AWS Bedrock Runtime Converse API.
    Bedrock,
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelProvider::Meow => write!(f, "meow"),
            ModelProvider::Bedrock => write!(f, "bedrock"),
        }
    }
}

impl FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "meow" => Ok(ModelProvider::Meow),
            "bedrock" => Ok(ModelProvider::Bedrock),
            other => Err(format!("invalid model provider: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: ModelProvider,

    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Optional system prompt sent with every turn.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_model() -> String {
    "anthropic.claude-3-haiku-20240307-v1:0".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            model: default_model(),
            region: default_region(),
            system_prompt: None,
        }
    }
}

/// Table names: 3-255 characters from `[A-Za-z0-9_.-]`.
pub fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    let valid_len = (3..=255).contains(&name.len());
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid_len && valid_chars {
        Ok(())
    } else {
        Err(ConfigError::InvalidTableName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = CatsimConfig::default();
        assert_eq!(config.table_name, "catsim-chat");
        assert!(config.database_url.is_none());
        assert_eq!(config.sweep_interval_secs, 300);
        assert!(!config.allow_empty_message);
        assert_eq!(config.model.provider, ModelProvider::Meow);
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: CatsimConfig = toml::from_str("").unwrap();
        assert_eq!(config.table_name, "catsim-chat");
        assert_eq!(config.model.region, "us-east-1");
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
table_name = "Cat-Simulator-ChatTable"
sweep_interval_secs = 60

[model]
provider = "bedrock"
region = "eu-west-1"
system_prompt = "You are a cat."
"#;
        let config: CatsimConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.table_name, "Cat-Simulator-ChatTable");
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.model.provider, ModelProvider::Bedrock);
        assert_eq!(config.model.region, "eu-west-1");
        assert_eq!(config.model.system_prompt.as_deref(), Some("You are a cat."));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("catsim-chat").is_ok());
        assert!(validate_table_name("Chat_Table.v2").is_ok());
        assert!(validate_table_name("ab").is_err());
        assert!(validate_table_name("chat; DROP TABLE x").is_err());
        assert!(validate_table_name("chat\"table").is_err());
        assert!(validate_table_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sweep_interval() {
        let config = CatsimConfig {
            sweep_interval_secs: 0,
            ..CatsimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_model_provider_parse() {
        assert_eq!("Bedrock".parse::<ModelProvider>().unwrap(), ModelProvider::Bedrock);
        assert_eq!("meow".parse::<ModelProvider>().unwrap(), ModelProvider::Meow);
        assert!("gpt".parse::<ModelProvider>().is_err());
    }
}
