//! Aliased field lookup over loosely-shaped JSON records

use serde_json::{Map, Value};

pub const SECTION_ID_ALIASES: [&str; 5] = ["sectionId", "sectionID", "id", "section_id", "name"];
pub const DISPLAY_NAME_ALIASES: [&str; 3] = ["displayName", "title", "sectionDisplayName"];

/// Value of the first alias present in `record`, following alias order.
///
/// Presence is what counts: a key holding `null` still wins over later aliases.
pub fn resolve<'a>(record: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| record.get(*key))
}

/// Like [`resolve`], converted with [`scalar_string`].
pub fn resolve_string(record: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    resolve(record, aliases).and_then(scalar_string)
}

/// String form of an opaque scalar. Strings are taken verbatim, numbers and
/// booleans use their JSON text; `null` and containers yield `None`.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// `record[key]` if it is a non-empty object.
pub fn object_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Map<String, Value>> {
    record
        .get(key)
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
}

/// `record[key]` if it is an array.
pub fn array_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a Vec<Value>> {
    record.get(key).and_then(Value::as_array)
}

/// `record[key]` if it is a string.
pub fn str_field<'a>(record: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}
