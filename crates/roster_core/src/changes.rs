//! Field-level change tracking for audit logs.
//!
//! [`diff`] compares two versions of a record through their encoded
//! documents, so every stored field takes part, including sequence fields
//! (compared as ordered sequences: reordering associates is a change).

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::document::{FieldValue, Record};
use crate::error::Result;

/// Old and new value of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub old: FieldValue,
    pub new: FieldValue,
}

/// Evidence of what an add or update did to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSet {
    /// The record did not exist before
    Created,
    /// Changed fields in stored field order
    Updated(IndexMap<String, FieldChange>),
}

const CREATED_MARKER: &str = "added new player";

impl ChangeSet {
    pub fn is_created(&self) -> bool {
        matches!(self, ChangeSet::Created)
    }

    /// True for an update that changed nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, ChangeSet::Updated(changes) if changes.is_empty())
    }

    /// Changed field names (empty for `Created`).
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ChangeSet::Created => Vec::new(),
            ChangeSet::Updated(changes) => changes.keys().map(String::as_str).collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        match self {
            ChangeSet::Created => None,
            ChangeSet::Updated(changes) => changes.get(field),
        }
    }

    /// JSON form stored in the log entry.
    ///
    /// `{"action": "added new player"}` for creations, otherwise
    /// `{"<field>": {"old": ..., "new": ...}, ...}`.
    pub fn to_json(&self) -> Value {
        match self {
            ChangeSet::Created => json!({ "action": CREATED_MARKER }),
            ChangeSet::Updated(changes) => Value::Object(
                changes
                    .iter()
                    .map(|(field, change)| {
                        (
                            field.clone(),
                            json!({
                                "old": change.old.to_plain_json(),
                                "new": change.new.to_plain_json(),
                            }),
                        )
                    })
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// Serialized form for the log document.
    pub fn render(&self) -> String {
        self.to_json().to_string()
    }

    /// Parse a stored change-set.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_json(&value))
    }

    /// Inverse of [`ChangeSet::to_json`]; entries without `old`/`new` are skipped.
    pub fn from_json(value: &Value) -> Self {
        if value.get("action").and_then(Value::as_str) == Some(CREATED_MARKER) {
            return ChangeSet::Created;
        }

        let mut changes = IndexMap::new();
        if let Some(object) = value.as_object() {
            for (field, entry) in object {
                let (Some(old), Some(new)) = (entry.get("old"), entry.get("new")) else {
                    continue;
                };
                changes.insert(
                    field.clone(),
                    FieldChange {
                        old: FieldValue::from_plain_json(old),
                        new: FieldValue::from_plain_json(new),
                    },
                );
            }
        }
        ChangeSet::Updated(changes)
    }
}

impl std::fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeSet::Created => f.write_str(CREATED_MARKER),
            ChangeSet::Updated(changes) if changes.is_empty() => f.write_str("no changes"),
            ChangeSet::Updated(changes) => {
                let parts: Vec<String> = changes
                    .iter()
                    .map(|(field, c)| format!("{}: {} → {}", field, c.old, c.new))
                    .collect();
                f.write_str(&parts.join("; "))
            }
        }
    }
}

/// Compute the change-set between two versions of a record.
///
/// `old = None` yields [`ChangeSet::Created`]. Otherwise every field whose
/// encoded value differs is reported; a field present on one side only is
/// reported with [`FieldValue::Absent`] on the other.
pub fn diff<R: Record>(old: Option<&R>, new: &R) -> ChangeSet {
    let Some(old) = old else {
        return ChangeSet::Created;
    };

    let old_doc = old.to_document();
    let new_doc = new.to_document();

    let mut changes = IndexMap::new();
    for (field, new_value) in &new_doc.fields {
        let old_value = old_doc.get(field);
        if old_value != new_value {
            changes.insert(
                field.clone(),
                FieldChange {
                    old: old_value.clone(),
                    new: new_value.clone(),
                },
            );
        }
    }
    for (field, old_value) in &old_doc.fields {
        if !new_doc.fields.contains_key(field) && !old_value.is_absent() {
            changes.insert(
                field.clone(),
                FieldChange {
                    old: old_value.clone(),
                    new: FieldValue::Absent,
                },
            );
        }
    }

    ChangeSet::Updated(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Guild, GuildRank, Player, fields};

    fn thorne() -> Player {
        Player::new("Thorne", 10, "Warrior")
    }

    #[test]
    fn test_absent_old_is_created() {
        let change = diff(None, &thorne());
        assert!(change.is_created());
        assert_eq!(change.to_json(), json!({"action": "added new player"}));
    }

    #[test]
    fn test_identical_records_have_no_changes() {
        let change = diff(Some(&thorne()), &thorne());
        assert!(change.is_empty());
        assert_eq!(change.to_string(), "no changes");
    }

    #[test]
    fn test_diff_reports_exactly_the_changed_fields() {
        let old = thorne();
        let mut new = thorne();
        new.level = 12;
        new.guild = Guild::member("Ashen Vow", GuildRank::Undisclosed);

        let change = diff(Some(&old), &new);
        assert_eq!(
            change.fields(),
            vec![fields::LEVEL, fields::GUILD, fields::GUILD_RANK]
        );

        let level = change.get(fields::LEVEL).unwrap();
        assert_eq!(level.old, FieldValue::Integer(10));
        assert_eq!(level.new, FieldValue::Integer(12));

        let rank = change.get(fields::GUILD_RANK).unwrap();
        assert_eq!(rank.old, FieldValue::from("N/A"));
        assert_eq!(rank.new, FieldValue::from("Unknown"));
    }

    #[test]
    fn test_reordering_associates_is_a_change() {
        let mut old = thorne();
        old.known_associates = vec!["Mira".into(), "Bob".into()];
        let mut new = old.clone();
        new.known_associates = vec!["Bob".into(), "Mira".into()];

        let change = diff(Some(&old), &new);
        assert_eq!(change.fields(), vec![fields::KNOWN_ASSOCIATES]);
    }

    #[test]
    fn test_newly_present_field_has_absent_old_value() {
        let old = thorne();
        let mut new = thorne();
        new.updated_by = Some("op@example.com".into());

        let change = diff(Some(&old), &new);
        let entry = change.get(fields::UPDATED_BY).unwrap();
        assert!(entry.old.is_absent());
        assert_eq!(entry.new, FieldValue::from("op@example.com"));
    }

    #[test]
    fn test_render_and_parse_round_trip() {
        let old = thorne();
        let mut new = thorne();
        new.level = 11;
        new.known_associates = vec!["Mira".into()];

        let change = diff(Some(&old), &new);
        let rendered = change.render();
        let value: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["Level"]["old"], 10);
        assert_eq!(value["Level"]["new"], 11);

        assert_eq!(ChangeSet::parse(&rendered).unwrap(), change);
        assert_eq!(
            ChangeSet::parse(&diff(None, &new).render()).unwrap(),
            ChangeSet::Created
        );
    }

    #[test]
    fn test_display_lists_changes() {
        let old = thorne();
        let mut new = thorne();
        new.level = 11;
        assert_eq!(diff(Some(&old), &new).to_string(), "Level: 10 → 11");
    }
}
