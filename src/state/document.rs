// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Merged state document.

use serde_json::{Map, Value};

use crate::error::ParseError;

use super::PrintStatus;

/// Name of the section that carries job progress.
pub(crate) const PRINT_SECTION: &str = "print";

/// The merged view of everything the printer has reported.
///
/// Top-level keys are sections (`print`, `system`, `info`, ...). Merging is a
/// one-level union: when both the stored and the incoming section are
/// objects, incoming fields win key by key; any other incoming value
/// replaces the stored one outright.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct StateDocument {
    sections: Map<String, Value>,
}

impl StateDocument {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds an inbound message into the document.
    ///
    /// Returns the number of sections the message touched.
    pub fn merge(&mut self, incoming: Map<String, Value>) -> usize {
        let touched = incoming.len();
        for (key, value) in incoming {
            match (self.sections.get_mut(&key), value) {
                (Some(Value::Object(existing)), Value::Object(fields)) => {
                    existing.extend(fields);
                }
                (_, value) => {
                    self.sections.insert(key, value);
                }
            }
        }
        touched
    }

    /// Returns a section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// Returns the typed reading of the `print` section.
    #[must_use]
    pub fn print_status(&self) -> PrintStatus {
        PrintStatus::from_section(self.section(PRINT_SECTION))
    }

    /// Returns the section names currently present.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Returns the number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if nothing has been reported yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Returns the document as a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.sections.clone())
    }

    /// Clears all state.
    pub fn clear(&mut self) {
        self.sections.clear();
    }
}

impl From<Map<String, Value>> for StateDocument {
    fn from(sections: Map<String, Value>) -> Self {
        Self { sections }
    }
}

/// Decodes a raw inbound payload into a top-level JSON object.
///
/// # Errors
///
/// Returns `ParseError` if the payload is not UTF-8, not JSON, or not a
/// JSON object.
pub fn decode_message(payload: &[u8]) -> Result<Map<String, Value>, ParseError> {
    let text = std::str::from_utf8(payload).map_err(|_| ParseError::InvalidUtf8)?;
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::NotAnObject(json_kind(&other))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn merge_is_additive_within_section() {
        let mut doc = StateDocument::new();
        doc.merge(obj(json!({"print": {"a": 1}})));
        doc.merge(obj(json!({"print": {"b": 2}})));
        assert_eq!(doc.to_value(), json!({"print": {"a": 1, "b": 2}}));
    }

    #[test]
    fn incoming_field_wins() {
        let mut doc = StateDocument::new();
        doc.merge(obj(json!({"print": {"a": 1, "b": 1}})));
        doc.merge(obj(json!({"print": {"a": 5}})));
        assert_eq!(doc.to_value(), json!({"print": {"a": 5, "b": 1}}));
    }

    #[test]
    fn non_object_replaces_section() {
        let mut doc = StateDocument::new();
        doc.merge(obj(json!({"print": {"a": 1}})));
        doc.merge(obj(json!({"print": "paused"})));
        assert_eq!(doc.to_value(), json!({"print": "paused"}));
    }

    #[test]
    fn object_replaces_scalar_section() {
        let mut doc = StateDocument::new();
        doc.merge(obj(json!({"print": "paused"})));
        doc.merge(obj(json!({"print": {"a": 1}})));
        assert_eq!(doc.to_value(), json!({"print": {"a": 1}}));
    }

    #[test]
    fn merge_only_one_level_deep() {
        let mut doc = StateDocument::new();
        doc.merge(obj(json!({"print": {"ams": {"tray": 1, "humidity": 3}}})));
        doc.merge(obj(json!({"print": {"ams": {"tray": 2}}})));
        assert_eq!(doc.to_value(), json!({"print": {"ams": {"tray": 2}}}));
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let message = obj(json!({"print": {"a": 1}, "system": {"led": "on"}}));
        let mut once = StateDocument::new();
        once.merge(message.clone());
        let mut twice = once.clone();
        twice.merge(message);
        assert_eq!(once, twice);
    }

    #[test]
    fn sections_are_independent() {
        let mut doc = StateDocument::new();
        doc.merge(obj(json!({"print": {"a": 1}})));
        doc.merge(obj(json!({"info": {"sn": "X1"}})));
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.section("print"), Some(&json!({"a": 1})));
        let names: Vec<_> = doc.section_names().collect();
        assert!(names.contains(&"info"));
    }

    #[test]
    fn decode_rejects_non_object() {
        assert!(matches!(
            decode_message(b"[1,2]"),
            Err(ParseError::NotAnObject("array"))
        ));
    }

    #[test]
    fn decode_rejects_malformed_json() {
        assert!(matches!(decode_message(b"{\"print\":"), Err(ParseError::Json(_))));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_message(&[0xff, 0xfe]),
            Err(ParseError::InvalidUtf8)
        ));
    }

    #[test]
    fn decode_accepts_object() {
        let map = decode_message(br#"{"print":{"gcode_state":"IDLE"}}"#).unwrap();
        assert!(map.contains_key("print"));
    }
}
