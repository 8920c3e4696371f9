//! Tagged-value documents as exchanged with the document store.
//!
//! Every stored record is a flat map of field name to [`FieldValue`]. On the
//! wire each value is an object with exactly one tag key:
//!
//! ```text
//! {"integerValue": "10"}
//! {"stringValue": "Warrior"}
//! {"arrayValue": {"values": [{"stringValue": "Mira"}]}}
//! {"timestampValue": "2024-05-01T12:00:00Z"}
//! {"nullValue": null}
//! ```
//!
//! Decoding never fails on an individual value: an unknown tag, or a tag whose
//! payload cannot be parsed, becomes [`FieldValue::Absent`] so the record layer
//! can apply its own defaults.
//!
//! Typed records implement [`Record`] to map themselves onto a [`Document`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::store::Collection;

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Integer-valued field
    Integer(i64),
    /// String-valued field
    String(String),
    /// Ordered string array (an empty array is still present, not absent)
    StringArray(Vec<String>),
    /// Point in time (audit log entries)
    Timestamp(DateTime<Utc>),
    /// Missing, null, or undecodable value
    Absent,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            FieldValue::StringArray(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// Plain JSON form (no tags), used when rendering change-sets.
    pub fn to_plain_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::String(s) => serde_json::Value::from(s.as_str()),
            FieldValue::StringArray(values) => serde_json::Value::from(values.clone()),
            FieldValue::Timestamp(ts) => serde_json::Value::from(ts.to_rfc3339()),
            FieldValue::Absent => serde_json::Value::Null,
        }
    }

    /// Inverse of [`FieldValue::to_plain_json`].
    ///
    /// Timestamps come back as strings; the plain form does not keep the tag.
    pub fn from_plain_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map_or(FieldValue::Absent, FieldValue::Integer),
            serde_json::Value::String(s) => FieldValue::String(s.clone()),
            serde_json::Value::Array(items) => FieldValue::StringArray(
                items
                    .iter()
                    .map(|item| item.as_str().unwrap_or_default().to_string())
                    .collect(),
            ),
            _ => FieldValue::Absent,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::StringArray(values) => write!(f, "[{}]", values.join(", ")),
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            FieldValue::Absent => write!(f, "(absent)"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::StringArray(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Absent, Into::into)
    }
}

// ============================================================================
// Wire representation
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    string_value: Option<String>,
    /// Integers travel as strings, but plain JSON numbers are accepted too.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    integer_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    array_value: Option<WireArray>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    null_value: Option<serde_json::Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireArray {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    values: Vec<WireValue>,
}

impl From<&FieldValue> for WireValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Integer(i) => WireValue {
                integer_value: Some(serde_json::Value::String(i.to_string())),
                ..Default::default()
            },
            FieldValue::String(s) => WireValue {
                string_value: Some(s.clone()),
                ..Default::default()
            },
            FieldValue::StringArray(values) => WireValue {
                array_value: Some(WireArray {
                    values: values
                        .iter()
                        .map(|v| WireValue {
                            string_value: Some(v.clone()),
                            ..Default::default()
                        })
                        .collect(),
                }),
                ..Default::default()
            },
            FieldValue::Timestamp(ts) => WireValue {
                timestamp_value: Some(ts.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)),
                ..Default::default()
            },
            FieldValue::Absent => WireValue {
                null_value: Some(serde_json::Value::Null),
                ..Default::default()
            },
        }
    }
}

impl From<WireValue> for FieldValue {
    fn from(wire: WireValue) -> Self {
        if let Some(s) = wire.string_value {
            return FieldValue::String(s);
        }
        if let Some(raw) = wire.integer_value {
            let parsed = match raw {
                serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
                serde_json::Value::Number(n) => n.as_i64(),
                _ => None,
            };
            return parsed.map_or(FieldValue::Absent, FieldValue::Integer);
        }
        if let Some(array) = wire.array_value {
            return FieldValue::StringArray(
                array
                    .values
                    .into_iter()
                    .map(|v| v.string_value.unwrap_or_default())
                    .collect(),
            );
        }
        if let Some(ts) = wire.timestamp_value {
            return DateTime::parse_from_rfc3339(&ts)
                .map(|dt| FieldValue::Timestamp(dt.with_timezone(&Utc)))
                .unwrap_or(FieldValue::Absent);
        }
        FieldValue::Absent
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WireValue::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // Anything that is not a tagged object (e.g. a bare string) is absent.
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(serde_json::from_value::<WireValue>(raw)
            .map(FieldValue::from)
            .unwrap_or(FieldValue::Absent))
    }
}

// ============================================================================
// Documents
// ============================================================================

/// A stored document: resource name plus ordered fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Full resource name assigned by the store (absent on documents built locally)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder pattern).
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// Get a field, treating missing fields as [`FieldValue::Absent`].
    pub fn get(&self, field: &str) -> &FieldValue {
        static ABSENT: FieldValue = FieldValue::Absent;
        self.fields.get(field).unwrap_or(&ABSENT)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).as_str()
    }

    pub fn get_integer(&self, field: &str) -> Option<i64> {
        self.get(field).as_integer()
    }

    pub fn get_timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get(field).as_timestamp()
    }

    /// Document key: the last segment of the resource name.
    pub fn key(&self) -> Option<&str> {
        self.name
            .as_deref()
            .and_then(|name| name.rsplit('/').next())
            .filter(|key| !key.is_empty())
    }

    /// Body sent on writes: only the fields, never the resource name.
    pub fn to_write_body(&self) -> serde_json::Value {
        serde_json::json!({ "fields": &self.fields })
    }
}

/// A typed record that can be stored as a [`Document`].
pub trait Record: Sized {
    /// Collection holding records of this kind.
    const COLLECTION: Collection;

    /// Encode into a generic document.
    fn to_document(&self) -> Document;

    /// Decode from a generic document, applying defaults for absent fields.
    fn from_document(doc: &Document) -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wire_encoding_uses_tags() {
        let doc = Document::new()
            .with("Level", 10i64)
            .with("Class", "Warrior")
            .with("Known Associates", vec!["Mira".to_string()]);

        let json = doc.to_write_body();
        assert_eq!(json["fields"]["Level"]["integerValue"], "10");
        assert_eq!(json["fields"]["Class"]["stringValue"], "Warrior");
        assert_eq!(
            json["fields"]["Known Associates"]["arrayValue"]["values"][0]["stringValue"],
            "Mira"
        );
    }

    #[test]
    fn test_empty_array_stays_an_empty_array() {
        let doc = Document::new().with("Known Associates", Vec::<String>::new());
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"arrayValue\":{}"));

        let decoded: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(
            decoded.get("Known Associates"),
            &FieldValue::StringArray(Vec::new())
        );
    }

    #[test]
    fn test_decode_accepts_numeric_integers() {
        let doc: Document =
            serde_json::from_str(r#"{"fields": {"Level": {"integerValue": 12}}}"#).unwrap();
        assert_eq!(doc.get_integer("Level"), Some(12));
    }

    #[test]
    fn test_unknown_or_broken_tags_decode_to_absent() {
        let doc: Document = serde_json::from_str(
            r#"{"fields": {
                "A": {"booleanValue": true},
                "B": {"integerValue": "twelve"},
                "C": {"timestampValue": "yesterday"},
                "D": {"nullValue": null},
                "E": "bare"
            }}"#,
        )
        .unwrap();

        for field in ["A", "B", "C", "D", "E", "Missing"] {
            assert!(doc.get(field).is_absent(), "{field} should be absent");
        }
    }

    #[test]
    fn test_array_elements_without_string_tag_become_empty() {
        let doc: Document = serde_json::from_str(
            r#"{"fields": {"Known Associates": {"arrayValue": {"values": [
                {"stringValue": "Mira"}, {"integerValue": "3"}
            ]}}}}"#,
        )
        .unwrap();
        assert_eq!(
            doc.get("Known Associates"),
            &FieldValue::StringArray(vec!["Mira".to_string(), String::new()])
        );
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let doc = Document::new().with("timestamp", ts);
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("2024-05-01T12:30:00Z"));

        let decoded: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.get_timestamp("timestamp"), Some(ts));
    }

    #[test]
    fn test_key_from_resource_name() {
        let doc: Document = serde_json::from_str(
            r#"{"name": "projects/p/databases/(default)/documents/players/thorne", "fields": {}}"#,
        )
        .unwrap();
        assert_eq!(doc.key(), Some("thorne"));
        assert_eq!(Document::new().key(), None);
    }

    #[test]
    fn test_write_body_omits_name() {
        let mut doc = Document::new().with("Name", "Thorne");
        doc.name = Some("projects/p/documents/players/thorne".into());
        let body = doc.to_write_body();
        assert!(body.get("name").is_none());
        assert_eq!(body["fields"]["Name"]["stringValue"], "Thorne");
    }

    #[test]
    fn test_plain_json_round_trip() {
        let values = [
            FieldValue::Integer(7),
            FieldValue::from("Mage"),
            FieldValue::StringArray(vec!["a".into(), "b".into()]),
            FieldValue::Absent,
        ];
        for value in values {
            assert_eq!(FieldValue::from_plain_json(&value.to_plain_json()), value);
        }
    }
}
