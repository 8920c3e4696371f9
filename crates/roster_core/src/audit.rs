//! Audit log entries.
//!
//! One entry is appended to the `logs` collection for every add or update.
//! Entries are immutable: this crate never rewrites or deletes them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::changes::ChangeSet;
use crate::document::{Document, Record};
use crate::error::Result;
use crate::store::{Collection, Session};

const USER_ID: &str = "userId";
const EMAIL: &str = "email";
const ACTION_TYPE: &str = "actionType";
const PLAYER_NAME: &str = "playerName";
const TIMESTAMP: &str = "timestamp";
const CHANGES: &str = "changes";

/// What the operator did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Add,
    Update,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Update => "update",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "add" => Some(ActionKind::Add),
            "update" => Some(ActionKind::Update),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub user_id: String,
    pub email: String,
    /// `None` when a stored entry carries an action this version does not know
    pub action: Option<ActionKind>,
    pub player_name: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub changes: ChangeSet,
}

impl LogEntry {
    /// Build an entry for an action performed in `session`.
    pub fn new(
        session: &Session,
        action: ActionKind,
        player_name: &str,
        changes: ChangeSet,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: session.user_id.clone(),
            email: session.email.clone(),
            action: Some(action),
            player_name: player_name.to_string(),
            timestamp: Some(timestamp),
            changes,
        }
    }
}

impl Record for LogEntry {
    const COLLECTION: Collection = Collection::Logs;

    fn to_document(&self) -> Document {
        Document::new()
            .with(USER_ID, self.user_id.as_str())
            .with(EMAIL, self.email.as_str())
            .with(ACTION_TYPE, self.action.map(|a| a.as_str()))
            .with(PLAYER_NAME, self.player_name.as_str())
            .with(TIMESTAMP, self.timestamp)
            .with(CHANGES, self.changes.render())
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let changes = match doc.get_str(CHANGES) {
            Some(raw) => ChangeSet::parse(raw).unwrap_or_else(|e| {
                log::warn!("Unreadable change-set in log entry {:?}: {}", doc.key(), e);
                ChangeSet::Updated(Default::default())
            }),
            None => ChangeSet::Updated(Default::default()),
        };

        Ok(Self {
            user_id: doc.get_str(USER_ID).unwrap_or_default().to_string(),
            email: doc.get_str(EMAIL).unwrap_or_default().to_string(),
            action: doc.get_str(ACTION_TYPE).and_then(ActionKind::parse),
            player_name: doc.get_str(PLAYER_NAME).unwrap_or_default().to_string(),
            timestamp: doc.get_timestamp(TIMESTAMP),
            changes,
        })
    }
}
