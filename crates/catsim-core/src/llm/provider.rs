//! ChatModel trait definition.

use catsim_types::chat::MessageRecord;
use catsim_types::llm::LlmError;
use serde_json::Value;

/// A language model that answers one chat turn.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in catsim-infra (e.g., `BedrockChatModel`).
pub trait ChatModel: Send + Sync {
    /// Human-readable model name for logs (e.g., "bedrock", "meow").
    fn name(&self) -> &str;

    /// Produce the reply payload for `turn` given the prior `history`,
    /// oldest first.
    ///
    /// The returned payload should carry `"role": "assistant"`; the caller
    /// enforces it before storing.
    fn reply(
        &self,
        history: &[MessageRecord],
        turn: &Value,
    ) -> impl std::future::Future<Output = Result<Value, LlmError>> + Send;
}
