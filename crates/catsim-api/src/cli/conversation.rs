//! Conversation commands: export, append, purge.

use anyhow::{Result, bail};
use console::style;
use serde_json::{Value, json};

use catsim_types::chat::MessageRecord;
use catsim_types::llm::MessageRole;

use crate::state::AppState;

/// Print a conversation as JSON or as a styled transcript.
pub async fn export(state: &AppState, chat_id: &str, json: bool) -> Result<()> {
    if chat_id.is_empty() {
        bail!("chat id must not be empty");
    }
    let records = state.chat_service.export_conversation(chat_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!(
            "  {} No turns in conversation {}",
            style("○").dim(),
            style(chat_id).cyan()
        );
        return Ok(());
    }

    println!();
    println!("  {} {}", style("Conversation").bold(), style(chat_id).cyan());
    println!();
    for record in &records {
        print_turn(record);
    }
    println!();
    println!(
        "  {}",
        style(format!("{} turn(s)", records.len())).dim()
    );

    Ok(())
}

fn print_turn(record: &MessageRecord) {
    let time = chrono::DateTime::from_timestamp_millis(record.sequence_key)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| record.sequence_key.to_string());

    let who = match record.role() {
        Some(MessageRole::Assistant) => style("cat ".to_string()).magenta().bold(),
        Some(MessageRole::User) => style("you ".to_string()).green().bold(),
        Some(MessageRole::System) => style("sys ".to_string()).yellow(),
        None => style("??? ".to_string()).dim(),
    };

    println!("  {} {} {}", style(time).dim(), who, turn_text(&record.payload));
}

/// Readable text of a payload: its text content blocks, else the raw JSON.
fn turn_text(payload: &Value) -> String {
    let text = payload
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .or_else(|| payload.get("text").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default();

    if text.is_empty() {
        payload.to_string()
    } else {
        text
    }
}

/// A CLI hint as JSON: integers stay numbers, anything else is passed on
/// as a string for lenient parsing.
fn hint_value(raw: &str) -> Value {
    raw.trim()
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(raw))
}

/// Append one text turn.
pub async fn append(
    state: &AppState,
    chat_id: &str,
    role: MessageRole,
    text: &str,
    timestamp: Option<&str>,
    ttl: Option<&str>,
    json: bool,
) -> Result<()> {
    if chat_id.is_empty() {
        bail!("chat id must not be empty");
    }
    let payload = json!({ "role": role.to_string(), "content": [{ "text": text }] });

    let appended = state
        .chat_service
        .append_turn(
            chat_id,
            Some(payload),
            timestamp.map(hint_value),
            ttl.map(hint_value),
        )
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&appended)?);
        return Ok(());
    }

    println!(
        "  {} Appended {} turn to {} at {}",
        style("✓").green().bold(),
        role,
        style(chat_id).cyan(),
        style(appended.record.sequence_key).bold()
    );
    Ok(())
}

/// Run one expiry sweep.
pub async fn purge(state: &AppState, json: bool) -> Result<()> {
    let removed = state.chat_service.store().purge_expired().await?;

    if json {
        println!("{}", json!({ "purged": removed }));
        return Ok(());
    }

    println!(
        "  {} Purged {} expired turn(s)",
        style("✓").green().bold(),
        style(removed).bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_value_keeps_integers_numeric() {
        assert_eq!(hint_value("1700000000000"), json!(1_700_000_000_000i64));
        assert_eq!(hint_value("2024-01-01T00:00:00Z"), json!("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn turn_text_prefers_content_blocks() {
        assert_eq!(
            turn_text(&json!({"content": [{"text": "a"}, {"text": "b"}]})),
            "a b"
        );
        assert_eq!(turn_text(&json!({"text": "plain"})), "plain");
        assert_eq!(turn_text(&json!({})), "{}");
    }
}
