//! Reply Parsing
//!
//! Small models wrap their JSON in prose, markdown fences, or reasoning
//! blocks. These helpers peel that off and deserialize what is left.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?m)^\s*```[A-Za-z0-9_-]*\s*$").ok())
        .as_ref()
}

/// Strip reasoning blocks and markdown code fences from a model reply.
///
/// Handles complete `<think>...</think>` blocks (everything up to the close
/// tag is dropped) and unclosed `<think>` tags (the text before the tag is
/// kept if there is any, otherwise the text after it).
pub fn strip_reasoning(text: &str) -> String {
    let lower = text.to_ascii_lowercase();

    let body = if let Some(end_pos) = lower.rfind("</think>") {
        &text[end_pos + "</think>".len()..]
    } else if let Some(start) = lower.find("<think>") {
        let before = text[..start].trim();
        if before.is_empty() {
            &text[start + "<think>".len()..]
        } else {
            before
        }
    } else {
        text
    };

    match fence_regex() {
        Some(re) => re.replace_all(body, "").trim().to_string(),
        None => body.replace("```json", "").replace("```", "").trim().to_string(),
    }
}

fn span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse the span between the first `{` and the last `}` as a JSON object.
pub fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(span(text, '{', '}')?).ok()?;
    value.is_object().then_some(value)
}

/// Parse the span between the first `[` and the last `]` as a JSON array.
pub fn extract_json_array(text: &str) -> Option<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_str(span(text, '[', ']')?).ok()?;
    value.is_array().then_some(value)
}

/// Deserialize a model reply into `T`.
///
/// Tries the whole cleaned reply first, then the embedded object span, then
/// the embedded array span. Returns `None` when nothing fits; callers treat
/// that as a cue to fall back.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Option<T> {
    let cleaned = strip_reasoning(text);

    if let Ok(v) = serde_json::from_str::<T>(&cleaned) {
        return Some(v);
    }

    for candidate in [
        span(&cleaned, '{', '}'),
        span(&cleaned, '[', ']'),
    ]
    .into_iter()
    .flatten()
    {
        if let Ok(v) = serde_json::from_str::<T>(candidate) {
            return Some(v);
        }
    }

    None
}

/// First characters of a reply, for log lines
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out.replace('\n', " ")
}
