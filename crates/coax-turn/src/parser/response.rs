//! Turns raw model text into an ordered action list.
//!
//! The model is asked for one JSON object but may wrap it in a code fence,
//! surround it with prose, or ignore the format entirely. Anything that does
//! not parse becomes a single conversational action carrying the raw text.

use coax_world::Direction;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::action::{ActionType, CharacterAction, Emotion};

#[derive(Debug, Deserialize)]
struct RawResponse {
    #[serde(default)]
    dialogue: String,
    #[serde(default)]
    actions: Vec<RawAction>,
    #[serde(default)]
    emotion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    params: RawParams,
}

#[derive(Debug, Default, Deserialize)]
struct RawParams {
    #[serde(default)]
    direction: Option<String>,
    #[serde(default)]
    steps: Option<Value>,
    #[serde(default)]
    target: Option<Value>,
    #[serde(default)]
    use_on: Option<Value>,
}

/// The JSON object inside `raw`: a fenced block's body, or the span from the
/// first `{` to the last `}`.
pub fn extract_json(raw: &str) -> Option<&str> {
    let body = fenced_body(raw).unwrap_or(raw);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end > start {
        Some(&body[start..=end])
    } else {
        None
    }
}

fn fenced_body(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after = &raw[open + 3..];
    let body_start = after.find('\n').map_or(0, |i| i + 1);
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// Parse a model reply. Never fails; malformed text becomes one `None`
/// action whose dialogue is the raw text cut to `fallback_len` characters.
///
/// Only the first action carries the reply's dialogue and emotion.
pub fn parse_response(raw: &str, fallback_len: usize) -> Vec<CharacterAction> {
    let parsed = extract_json(raw).and_then(|json| match serde_json::from_str::<RawResponse>(json) {
        Ok(response) => Some(response),
        Err(err) => {
            debug!(error = %err, "model reply is not valid action JSON");
            None
        }
    });

    let Some(response) = parsed else {
        return vec![fallback(raw, fallback_len)];
    };

    let emotion = response
        .emotion
        .as_deref()
        .map(Emotion::parse)
        .unwrap_or_default();

    let mut actions: Vec<CharacterAction> = response.actions.into_iter().map(convert).collect();
    match actions.first_mut() {
        Some(first) => {
            first.dialogue = response.dialogue;
            first.emotion = emotion;
        }
        None => actions.push(CharacterAction::say(response.dialogue, emotion)),
    }
    actions
}

fn convert(raw: RawAction) -> CharacterAction {
    let action_type = raw
        .action
        .as_deref()
        .map(ActionType::parse)
        .unwrap_or_default();
    let params = raw.params;
    CharacterAction {
        action_type,
        direction: params.direction.as_deref().and_then(Direction::parse),
        steps: params.steps.as_ref().and_then(value_to_u32).unwrap_or(1).max(1),
        target: params.target.as_ref().and_then(value_to_string),
        use_on: params.use_on.as_ref().and_then(value_to_string),
        ..CharacterAction::default()
    }
}

fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .map(|n| n.min(u64::from(u32::MAX)) as u32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn fallback(raw: &str, fallback_len: usize) -> CharacterAction {
    let text: String = raw.trim().chars().take(fallback_len).collect();
    let dialogue = if text.is_empty() { "Hmm?".to_string() } else { text };
    CharacterAction::say(dialogue, Emotion::Confused)
}
