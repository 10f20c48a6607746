//! Reply normalization for loosely specified upstream payloads
//!
//! Gradio Spaces answer in a handful of shapes depending on version and on how
//! the Space was written. Replies are classified into a [`ReplyShape`] and then
//! flattened into a single string with a fixed priority:
//! string, array head, `data` field, well-known string field, JSON text.

use serde_json::Value;

/// String fields checked on objects that carry no `data` member
const TEXT_FIELDS: &[&str] = &["text", "output", "generated_text", "response"];

/// Recognized reply shapes, in priority order
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyShape<'a> {
    /// `"hello"`
    Text(&'a str),
    /// `["hello", ...]`
    List(&'a [Value]),
    /// `{"data": ["hello", ...]}`
    DataList(&'a [Value]),
    /// `{"data": "hello"}`
    DataText(&'a str),
    /// `{"generated_text": "hello"}` and friends
    Field(&'a str),
    /// Anything else
    Opaque(&'a Value),
}

impl<'a> ReplyShape<'a> {
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::String(s) => ReplyShape::Text(s),
            Value::Array(items) if !items.is_empty() => ReplyShape::List(items),
            Value::Object(map) => {
                match map.get("data") {
                    Some(Value::Array(items)) if !items.is_empty() => {
                        return ReplyShape::DataList(items)
                    }
                    Some(Value::String(s)) => return ReplyShape::DataText(s),
                    _ => {}
                }
                TEXT_FIELDS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(Value::as_str))
                    .map(ReplyShape::Field)
                    .unwrap_or(ReplyShape::Opaque(value))
            }
            other => ReplyShape::Opaque(other),
        }
    }
}

/// Flatten any reply into one string
pub fn normalize_reply(value: &Value) -> String {
    match ReplyShape::classify(value) {
        ReplyShape::Text(s) | ReplyShape::DataText(s) | ReplyShape::Field(s) => s.to_string(),
        ReplyShape::List(items) | ReplyShape::DataList(items) => normalize_reply(&items[0]),
        ReplyShape::Opaque(other) => other.to_string(),
    }
}

/// Normalize a raw response body, keeping non-JSON bodies as they are
pub fn normalize_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => normalize_reply(&value),
        Err(_) => body.trim().to_string(),
    }
}
