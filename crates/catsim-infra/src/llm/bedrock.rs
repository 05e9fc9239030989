//! BedrockChatModel -- [`ChatModel`] backed by the AWS Bedrock Runtime
//! Converse API.
//!
//! Authenticates with a Bedrock bearer token (`AWS_BEARER_TOKEN_BEDROCK`).
//! The token is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};

use catsim_core::llm::provider::ChatModel;
use catsim_types::chat::{MessageRecord, payload_role};
use catsim_types::llm::{LlmError, MessageRole};

/// Bedrock Converse chat model.
///
/// Does NOT derive Debug so the bearer token cannot leak through it.
pub struct BedrockChatModel {
    client: reqwest::Client,
    token: SecretString,
    model_id: String,
    base_url: String,
    system_prompt: Option<String>,
}

impl BedrockChatModel {
    /// Create a model for `model_id` in `region`.
    pub fn new(token: SecretString, model_id: String, region: &str) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            token,
            model_id,
            base_url: format!("https://bedrock-runtime.{region}.amazonaws.com"),
            system_prompt: None,
        })
    }

    /// Point the client at another endpoint (VPC endpoints, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_system_prompt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    fn url(&self) -> String {
        format!("{}/model/{}/converse", self.base_url, self.model_id)
    }

    /// Build the Converse request body from the stored history and the new
    /// turn.
    fn request_body(&self, history: &[MessageRecord], turn: &Value) -> Value {
        let mut body = Map::new();
        body.insert(
            "messages".to_string(),
            Value::Array(converse_messages(
                history.iter().map(|r| &r.payload).chain(std::iter::once(turn)),
            )),
        );
        if let Some(prompt) = &self.system_prompt {
            body.insert("system".to_string(), json!([{ "text": prompt }]));
        }
        Value::Object(body)
    }
}

/// Project stored payloads onto Converse messages.
///
/// Only `user` and `assistant` turns with usable content are sent, extra
/// payload fields are dropped, and consecutive turns of the same role are
/// merged since Converse requires alternation. Leading assistant turns are
/// skipped: the conversation must open with the user.
fn converse_messages<'a>(payloads: impl Iterator<Item = &'a Value>) -> Vec<Value> {
    let mut out: Vec<(MessageRole, Vec<Value>)> = Vec::new();

    for payload in payloads {
        let role = match payload_role(payload) {
            Some(role @ (MessageRole::User | MessageRole::Assistant)) => role,
            _ => continue,
        };
        let Some(content) = content_blocks(payload) else {
            continue;
        };
        if out.is_empty() && role == MessageRole::Assistant {
            continue;
        }
        match out.last_mut() {
            Some((last, blocks)) if *last == role => blocks.extend(content),
            _ => out.push((role, content)),
        }
    }

    out.into_iter()
        .map(|(role, content)| json!({ "role": role.to_string(), "content": content }))
        .collect()
}

fn content_blocks(payload: &Value) -> Option<Vec<Value>> {
    match payload.get("content") {
        Some(Value::Array(blocks)) if !blocks.is_empty() => Some(blocks.clone()),
        Some(Value::String(text)) => Some(vec![json!({ "text": text })]),
        _ => payload
            .get("text")
            .and_then(Value::as_str)
            .map(|text| vec![json!({ "text": text })]),
    }
}

impl ChatModel for BedrockChatModel {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn reply(&self, history: &[MessageRecord], turn: &Value) -> Result<Value, LlmError> {
        let url = self.url();
        let body = self.request_body(history, turn);

        tracing::debug!(url = %url, model_id = %self.model_id, "Bedrock converse request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, "Bedrock API error response");
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited { retry_after_ms },
                400 => LlmError::InvalidRequest(error_body),
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let mut payload: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        match payload.pointer_mut("/output/message").map(Value::take) {
            Some(message @ Value::Object(_)) => Ok(message),
            _ => Err(LlmError::Deserialization(
                "response has no output.message".to_string(),
            )),
        }
    }
}
