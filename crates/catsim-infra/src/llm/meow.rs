//! Offline cat. Answers every turn with cat noises and the soundtracks the
//! client should play, without calling out to any service.

use serde_json::{Value, json};

use catsim_core::llm::provider::ChatModel;
use catsim_types::chat::MessageRecord;
use catsim_types::llm::LlmError;

const SOUNDS: [(&str, &str); 4] = [
    ("Meow.", "meow"),
    ("Purrrr.", "purr"),
    ("Mrrp?", "trill"),
    ("Mew!", "mew"),
];

/// Deterministic offline model.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeowModel;

impl MeowModel {
    pub fn new() -> Self {
        Self
    }
}

fn turn_text(turn: &Value) -> String {
    match turn.get("content") {
        Some(Value::Array(blocks)) => blocks
            .iter()
            .filter_map(|b| b.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join(" "),
        _ => turn
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

impl ChatModel for MeowModel {
    fn name(&self) -> &str {
        "meow"
    }

    async fn reply(&self, history: &[MessageRecord], turn: &Value) -> Result<Value, LlmError> {
        let text = turn_text(turn);
        // One noise per word, at most three; questions always get a trill.
        let words = text.split_whitespace().count().clamp(1, 3);
        let offset = history.len() % SOUNDS.len();

        let mut picked: Vec<(&str, &str)> = (0..words)
            .map(|i| SOUNDS[(offset + i) % SOUNDS.len()])
            .collect();
        if text.trim_end().ends_with('?') && !picked.contains(&SOUNDS[2]) {
            picked.push(SOUNDS[2]);
        }

        let speech = picked.iter().map(|(s, _)| *s).collect::<Vec<_>>().join(" ");
        let soundtracks: Vec<&str> = picked.iter().map(|(_, t)| *t).collect();

        Ok(json!({
            "role": "assistant",
            "content": [{ "text": speech }],
            "soundtracks": soundtracks,
        }))
    }
}
