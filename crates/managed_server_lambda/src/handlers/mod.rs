use serde_json::Value;

pub mod api;
pub mod data_processor;
pub mod response;
pub mod websocket;

/// Reads an optional event field as text. Strings pass through, `null` counts
/// as absent and any other value is rendered as its JSON text.
pub(crate) fn lenient_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
