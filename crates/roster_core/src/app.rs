//! Roster application service.
//!
//! [`RosterApp`] runs the operator workflows against a [`DocumentStore`] on
//! behalf of one signed-in [`Session`]. Each workflow is a sequence of
//! independent store calls: a failure partway through leaves the earlier
//! writes in place and is reported to the caller instead of rolled back.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::audit::{ActionKind, LogEntry};
use crate::changes::{ChangeSet, diff};
use crate::document::Record;
use crate::error::{Result, RosterError};
use crate::export::{ExportStats, Exporter};
use crate::fs::FileSystem;
use crate::links::{LinkReport, link_associates};
use crate::player::{Player, PlayerForm, player_key};
use crate::query::RosterQuery;
use crate::store::{Collection, DocumentStore, Session, check_permission};

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Result of adding a player.
#[derive(Debug)]
pub struct AddOutcome {
    /// The record as written
    pub player: Player,
    /// Set when the audit entry could not be written (the player still was)
    pub audit_error: Option<RosterError>,
}

/// Result of updating a player.
#[derive(Debug)]
pub struct UpdateOutcome {
    /// The record as written
    pub player: Player,
    /// What changed relative to the previous record
    pub changes: ChangeSet,
    /// Set when the audit entry could not be written (the player still was)
    pub audit_error: Option<RosterError>,
    /// Back-links written to the player's associates
    pub links: LinkReport,
}

/// Operator workflows over a document store.
pub struct RosterApp<S: DocumentStore> {
    store: S,
    session: Session,
    clock: Clock,
}

impl<S: DocumentStore> RosterApp<S> {
    pub fn new(store: S, session: Session) -> Self {
        Self {
            store,
            session,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the clock used for `updatedAt` and log timestamps.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Box::new(clock);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch one player by name (case-insensitive).
    pub fn get_player(&self, name: &str) -> Result<Option<Player>> {
        check_permission(&self.session)?;
        self.store
            .get(&self.session, Collection::Players, &player_key(name))?
            .map(|doc| Player::from_document(&doc))
            .transpose()
    }

    /// Fetch the whole roster in store order.
    ///
    /// Documents that cannot be decoded are skipped with a warning.
    pub fn roster(&self) -> Result<Vec<Player>> {
        check_permission(&self.session)?;
        let documents = self.store.list_all(&self.session, Collection::Players)?;

        let mut players = Vec::with_capacity(documents.len());
        for doc in &documents {
            match Player::from_document(doc) {
                Ok(player) => players.push(player),
                Err(e) => log::warn!("Skipping player document: {}", e),
            }
        }
        Ok(players)
    }

    /// Filter and sort a fresh roster snapshot.
    pub fn query(&self, query: &RosterQuery) -> Result<Vec<Player>> {
        Ok(query.apply(&self.roster()?))
    }

    /// Validate and store a new player, then log the addition.
    ///
    /// Refuses a name that is already on the roster.
    pub fn add_player(&self, form: &PlayerForm) -> Result<AddOutcome> {
        let mut player = form.validate()?;
        check_permission(&self.session)?;

        if self.get_player(&player.name)?.is_some() {
            return Err(RosterError::Validation(format!(
                "player '{}' already exists; update it instead",
                player.name
            )));
        }

        player.stamp(&self.session.email, self.now());
        self.write_player(&player)?;
        log::info!("Added player '{}'", player.name);

        let audit_error = self
            .record_change(ActionKind::Add, None, &player)
            .err()
            .inspect(|e| log::warn!("Audit entry for '{}' not written: {}", player.name, e));

        Ok(AddOutcome {
            player,
            audit_error,
        })
    }

    /// Validate and store a new version of an existing player.
    ///
    /// Writes the record, logs the field-level changes, then makes every
    /// named associate list this player back. Audit and link failures are
    /// returned in the outcome; only the primary write can fail the call.
    pub fn update_player(&self, form: &PlayerForm) -> Result<UpdateOutcome> {
        let mut player = form.validate()?;
        check_permission(&self.session)?;

        let previous = self
            .get_player(&player.name)?
            .ok_or_else(|| RosterError::NotFound(player.name.clone()))?;

        let now = self.now();
        player.stamp(&self.session.email, now);
        self.write_player(&player)?;
        log::info!("Updated player '{}'", player.name);

        let changes = diff(Some(&previous), &player);
        let audit_error = self
            .log_entry(ActionKind::Update, &player.name, changes.clone())
            .err()
            .inspect(|e| log::warn!("Audit entry for '{}' not written: {}", player.name, e));

        let links = link_associates(&self.store, &self.session, &player, now);

        Ok(UpdateOutcome {
            player,
            changes,
            audit_error,
            links,
        })
    }

    /// Diff two versions of a player and append the audit entry.
    ///
    /// Returns the change-set that was logged.
    pub fn record_change(
        &self,
        action: ActionKind,
        old: Option<&Player>,
        new: &Player,
    ) -> Result<ChangeSet> {
        let changes = diff(old, new);
        self.log_entry(action, &new.name, changes.clone())?;
        Ok(changes)
    }

    /// Every audit entry, newest first.
    pub fn audit_log(&self) -> Result<Vec<LogEntry>> {
        check_permission(&self.session)?;
        let documents = self.store.list_all(&self.session, Collection::Logs)?;

        let mut entries = documents
            .iter()
            .map(LogEntry::from_document)
            .collect::<Result<Vec<_>>>()?;
        // Entries without a timestamp sort last.
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// Export a fresh roster snapshot under `root`.
    pub fn export<FS: FileSystem>(&self, fs: FS, root: &Path) -> Result<ExportStats> {
        let roster = self.roster()?;
        Exporter::new(fs).export(&roster, root)
    }

    fn write_player(&self, player: &Player) -> Result<()> {
        self.store.put(
            &self.session,
            Collection::Players,
            &player.key(),
            &player.to_document(),
        )
    }

    fn log_entry(&self, action: ActionKind, player_name: &str, changes: ChangeSet) -> Result<()> {
        check_permission(&self.session)?;
        let entry = LogEntry::new(&self.session, action, player_name, changes, self.now());
        let key = self
            .store
            .append(&self.session, Collection::Logs, &entry.to_document())?;
        log::debug!("Logged {} of '{}' as {}", action, player_name, key);
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}
