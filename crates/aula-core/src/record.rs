//! Raw event records decoded from capture batches.
//!
//! Records stay dynamically keyed at this stage: the payload schema is not
//! imposed until normalization, so malformed rows can be filtered on their
//! raw string content first. Every value is carried as text regardless of
//! its JSON type.

use serde_json::Value;
use std::collections::BTreeMap;

/// Well-known field names in event payloads.
pub mod fields {
    /// Completion percentage as numeric text; blank in some legacy batches.
    pub const PERCENTAGE: &str = "percentage";
    /// Event time as numeric text, Unix seconds.
    pub const TIMESTAMP: &str = "timestamp";
    /// Path-like content identifier.
    pub const URL: &str = "url";
    /// Seconds spent on the unit as numeric text. Optional.
    pub const TIME_SPENT: &str = "time_spent";
    /// Content/Evaluation tag. Optional.
    pub const UNIT_TYPE: &str = "unit_type";
    /// Writer-internal id, dropped during normalization.
    pub const ID: &str = "_id";
    /// Writer-internal state, dropped during normalization.
    pub const STATE: &str = "state";
}

/// One event payload as a field-name → text mapping.
///
/// Backed by an ordered map so iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord(BTreeMap<String, String>);

impl RawRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a decoded JSON payload object.
    ///
    /// Scalars are coerced to text: strings stay as-is, numbers and bools
    /// take their canonical JSON rendering, nulls become the empty string,
    /// and nested arrays/objects are kept as compact JSON text.
    pub fn from_json_object(object: &serde_json::Map<String, Value>) -> Self {
        Self(
            object
                .iter()
                .map(|(key, value)| (key.clone(), text_value(value)))
                .collect(),
        )
    }

    /// Look up a field's text value.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Set a field, returning any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(field.into(), value.into())
    }

    /// Remove a field, returning its value if it was present.
    pub fn remove(&mut self, field: &str) -> Option<String> {
        self.0.remove(field)
    }

    /// Whether the record carries the field.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of fields in the record.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Consume the record, yielding the underlying map.
    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

impl FromIterator<(String, String)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
