//! Chat model implementations.
//!
//! Contains the concrete [`ChatModel`] adapters and a factory
//! ([`build_chat_model`]) that picks one from a [`ModelConfig`].

pub mod bedrock;
pub mod meow;

use secrecy::SecretString;
use serde_json::Value;

use catsim_core::llm::provider::ChatModel;
use catsim_types::chat::MessageRecord;
use catsim_types::config::{ModelConfig, ModelProvider};
use catsim_types::llm::LlmError;

use self::bedrock::BedrockChatModel;
use self::meow::MeowModel;

/// Environment variable holding the Bedrock bearer token.
pub const BEDROCK_TOKEN_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Any configured chat model.
///
/// `ChatModel` uses RPITIT and is not object-safe, so the runtime choice is
/// an enum rather than a trait object.
pub enum AnyChatModel {
    Meow(MeowModel),
    Bedrock(BedrockChatModel),
}

impl ChatModel for AnyChatModel {
    fn name(&self) -> &str {
        match self {
            AnyChatModel::Meow(m) => m.name(),
            AnyChatModel::Bedrock(m) => m.name(),
        }
    }

    async fn reply(&self, history: &[MessageRecord], turn: &Value) -> Result<Value, LlmError> {
        match self {
            AnyChatModel::Meow(m) => m.reply(history, turn).await,
            AnyChatModel::Bedrock(m) => m.reply(history, turn).await,
        }
    }
}

/// Build the model named by `config`.
///
/// `bedrock_token` is the resolved bearer token; Bedrock without one is an
/// authentication error.
pub fn build_chat_model(
    config: &ModelConfig,
    bedrock_token: Option<SecretString>,
) -> Result<AnyChatModel, LlmError> {
    match config.provider {
        ModelProvider::Meow => Ok(AnyChatModel::Meow(MeowModel::new())),
        ModelProvider::Bedrock => {
            let token = bedrock_token.ok_or(LlmError::AuthenticationFailed)?;
            let model = BedrockChatModel::new(token, config.model.clone(), &config.region)?
                .with_system_prompt(config.system_prompt.clone());
            Ok(AnyChatModel::Bedrock(model))
        }
    }
}

/// Read the Bedrock bearer token from the environment.
pub fn bedrock_token_from_env() -> Option<SecretString> {
    std::env::var(BEDROCK_TOKEN_ENV)
        .ok()
        .filter(|t| !t.is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meow_needs_no_token() {
        let model = build_chat_model(&ModelConfig::default(), None).unwrap();
        assert_eq!(model.name(), "meow");
    }

    #[test]
    fn test_bedrock_requires_token() {
        let config = ModelConfig {
            provider: ModelProvider::Bedrock,
            ..ModelConfig::default()
        };
        assert!(matches!(
            build_chat_model(&config, None),
            Err(LlmError::AuthenticationFailed)
        ));

        let model = build_chat_model(&config, Some(SecretString::from("t"))).unwrap();
        assert_eq!(model.name(), "bedrock");
    }
}
