//! Normalization of loosely typed `images` columns.
//!
//! Rows written by different tools store images as a JSON array, as a
//! JSON-encoded string holding an array, or not at all. Every reader goes
//! through [`parse_images`] so handlers always hand out `Vec<String>`.

use serde_json::Value;

/// Maps an `images` field of unknown shape to an ordered list of URLs.
///
/// Arrays are stringified element by element, strings are decoded as JSON and
/// kept only when they hold an array. Everything else, including malformed
/// JSON, yields an empty list.
pub fn parse_images(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(stringify).collect(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items.iter().map(stringify).collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Like [`parse_images`], but unwraps one extra layer of string encoding.
///
/// Order rows embed product images that were stringified twice on the way in.
pub fn parse_images_nested(value: &Value) -> Vec<String> {
    let Value::String(raw) = value else {
        return parse_images(value);
    };
    if raw == "null" {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::String(inner)) => parse_images(&Value::String(inner)),
        Ok(Value::Array(items)) => items.iter().map(stringify).collect(),
        _ => Vec::new(),
    }
}

/// Same as [`parse_images`] for a nullable column.
pub fn parse_optional_images(value: Option<&Value>) -> Vec<String> {
    value.map(parse_images).unwrap_or_default()
}

fn stringify(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
