//! Reciprocal known-associate links.
//!
//! After a player is updated, every associate it names should list it back.
//! [`link_associates`] walks the associates in order and appends the missing
//! back-links one record at a time. It is a best-effort pass: one failing
//! associate never stops the others, and nothing is rolled back.
//!
//! Back-links are written onto the stored document itself: only the
//! associate list and the `updatedBy`/`updatedAt` stamp change, every other
//! field is written back as it was read.
//!
//! Associates that have no record yet are skipped and reported in
//! [`LinkReport::missing`]. Creating placeholder records is left to the
//! operator.

use chrono::{DateTime, Utc};

use crate::document::{Document, FieldValue, Record};
use crate::error::RosterError;
use crate::player::{Player, fields, player_key, stamp_document};
use crate::store::{Collection, DocumentStore, Session};

/// A back-link that could not be written.
#[derive(Debug)]
pub struct LinkFailure {
    pub associate: String,
    pub error: RosterError,
}

/// Outcome of one reciprocal-link pass.
#[derive(Debug, Default)]
pub struct LinkReport {
    /// Associates that now list the player back (one write each)
    pub linked: Vec<String>,
    /// Associates that already listed the player (no write)
    pub already_linked: Vec<String>,
    /// Associates without a stored record (skipped)
    pub missing: Vec<String>,
    /// Per-associate fetch, decode or write failures
    pub failures: Vec<LinkFailure>,
}

impl LinkReport {
    /// True when every named associate is now symmetric with the player.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failures.is_empty()
    }

    /// Number of associate records written.
    pub fn writes(&self) -> usize {
        self.linked.len()
    }
}

/// Make each of `player`'s associates list `player` back.
///
/// Associates are handled serially in the order listed. Each one that needs
/// the back-link is read, extended, stamped with `session.email` and `now`,
/// and written back with its other fields untouched. Running this again once the links are
/// symmetric performs no writes.
pub fn link_associates<S>(
    store: &S,
    session: &Session,
    player: &Player,
    now: DateTime<Utc>,
) -> LinkReport
where
    S: DocumentStore + ?Sized,
{
    let mut report = LinkReport::default();

    for associate in &player.known_associates {
        if player.is_named(associate) {
            log::debug!("Skipping self-reference in {}'s associates", player.name);
            continue;
        }

        match link_one(store, session, player, associate, now) {
            Ok(LinkStep::Linked) => report.linked.push(associate.clone()),
            Ok(LinkStep::AlreadyLinked) => report.already_linked.push(associate.clone()),
            Ok(LinkStep::Missing) => {
                log::warn!(
                    "Associate '{}' of '{}' has no record; back-link skipped",
                    associate,
                    player.name
                );
                report.missing.push(associate.clone());
            }
            Err(error) => {
                log::warn!(
                    "Could not link '{}' back to '{}': {}",
                    associate,
                    player.name,
                    error
                );
                report.failures.push(LinkFailure {
                    associate: associate.clone(),
                    error,
                });
            }
        }
    }

    report
}

enum LinkStep {
    Linked,
    AlreadyLinked,
    Missing,
}

fn link_one<S>(
    store: &S,
    session: &Session,
    player: &Player,
    associate: &str,
    now: DateTime<Utc>,
) -> crate::error::Result<LinkStep>
where
    S: DocumentStore + ?Sized,
{
    let key = player_key(associate);
    let Some(mut doc) = store.get(session, Collection::Players, &key)? else {
        return Ok(LinkStep::Missing);
    };

    let record = Player::from_document(&doc)?;
    if record.has_associate(&player.name) {
        return Ok(LinkStep::AlreadyLinked);
    }

    let mut associates = stored_associates(&doc);
    associates.push(player.name.clone());
    doc.set(fields::KNOWN_ASSOCIATES, associates);
    stamp_document(&mut doc, &session.email, now);
    store.put(session, Collection::Players, &key, &doc)?;
    log::info!("Linked '{}' back to '{}'", record.name, player.name);
    Ok(LinkStep::Linked)
}

/// Associates exactly as stored; a lone string counts as a one-entry list.
fn stored_associates(doc: &Document) -> Vec<String> {
    match doc.get(fields::KNOWN_ASSOCIATES) {
        FieldValue::StringArray(values) => values.clone(),
        FieldValue::String(value) if !value.trim().is_empty() => vec![value.clone()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn seed(store: &InMemoryStore, player: &Player) {
        store.insert(Collection::Players, &player.key(), player.to_document());
    }

    fn stored(store: &InMemoryStore, name: &str) -> Player {
        let doc = store
            .document(Collection::Players, &player_key(name))
            .unwrap();
        Player::from_document(&doc).unwrap()
    }

    fn thorne_with(associates: &[&str]) -> Player {
        let mut thorne = Player::new("Thorne", 10, "Warrior");
        thorne.known_associates = associates.iter().map(|a| a.to_string()).collect();
        thorne
    }

    #[test]
    fn test_links_missing_back_reference() {
        let store = InMemoryStore::new();
        let session = store.verified_session("op@example.com");
        seed(&store, &Player::new("Mira", 30, "Mage"));

        let report = link_associates(&store, &session, &thorne_with(&["Mira"]), Utc::now());
        assert_eq!(report.linked, vec!["Mira"]);
        assert!(report.is_complete());

        let mira = stored(&store, "Mira");
        assert_eq!(mira.known_associates, vec!["Thorne"]);
        assert_eq!(mira.updated_by.as_deref(), Some("op@example.com"));
    }

    #[test]
    fn test_second_pass_is_a_no_op() {
        let store = InMemoryStore::new();
        let session = store.verified_session("op@example.com");
        seed(&store, &Player::new("Mira", 30, "Mage"));
        let thorne = thorne_with(&["Mira"]);

        link_associates(&store, &session, &thorne, Utc::now());
        let after_first = store.document(Collection::Players, "mira");
        let writes = store.write_count(Collection::Players);

        let report = link_associates(&store, &session, &thorne, Utc::now());
        assert_eq!(report.already_linked, vec!["Mira"]);
        assert_eq!(report.writes(), 0);
        assert_eq!(store.write_count(Collection::Players), writes);
        assert_eq!(store.document(Collection::Players, "mira"), after_first);
    }

    #[test]
    fn test_membership_check_is_case_insensitive() {
        let store = InMemoryStore::new();
        let session = store.verified_session("op@example.com");
        let mut mira = Player::new("Mira", 30, "Mage");
        mira.known_associates = vec!["THORNE".into()];
        seed(&store, &mira);

        let report = link_associates(&store, &session, &thorne_with(&["mira"]), Utc::now());
        assert_eq!(report.already_linked, vec!["mira"]);
        assert_eq!(stored(&store, "Mira").known_associates, vec!["THORNE"]);
    }

    #[test]
    fn test_missing_associate_is_skipped_and_reported() {
        let store = InMemoryStore::new();
        let session = store.verified_session("op@example.com");

        let report = link_associates(&store, &session, &thorne_with(&["Ghost"]), Utc::now());
        assert_eq!(report.missing, vec!["Ghost"]);
        assert!(!report.is_complete());
        assert!(store.document(Collection::Players, "ghost").is_none());
    }

    #[test]
    fn test_failure_does_not_stop_remaining_associates() {
        let store = InMemoryStore::new();
        let session = store.verified_session("op@example.com");
        seed(&store, &Player::new("Mira", 30, "Mage"));
        seed(&store, &Player::new("Bob", 12, "Rogue"));
        seed(&store, &Player::new("Ash", 40, "Cleric"));
        store.fail_writes_for(Collection::Players, "mira");
        store.fail_reads_for(Collection::Players, "bob");

        let report = link_associates(
            &store,
            &session,
            &thorne_with(&["Mira", "Bob", "Ash"]),
            Utc::now(),
        );

        let failed: Vec<&str> = report
            .failures
            .iter()
            .map(|f| f.associate.as_str())
            .collect();
        assert_eq!(failed, vec!["Mira", "Bob"]);
        assert_eq!(report.linked, vec!["Ash"]);
        assert_eq!(stored(&store, "Ash").known_associates, vec!["Thorne"]);
        assert!(stored(&store, "Mira").known_associates.is_empty());
    }

    #[test]
    fn test_back_link_keeps_fields_it_does_not_own() {
        let store = InMemoryStore::new();
        let session = store.verified_session("op@example.com");
        let mira = Document::new()
            .with(fields::NAME, "Mira")
            .with(fields::CLASS, "Mage")
            .with("Server", "EU-West")
            .with(fields::KNOWN_ASSOCIATES, "Bob");
        store.insert(Collection::Players, "mira", mira);

        let report = link_associates(&store, &session, &thorne_with(&["Mira"]), Utc::now());
        assert_eq!(report.linked, vec!["Mira"]);

        let doc = store.document(Collection::Players, "mira").unwrap();
        assert_eq!(doc.get_str("Server"), Some("EU-West"));
        assert_eq!(doc.get(fields::LEVEL), &FieldValue::Absent);
        assert_eq!(
            doc.get(fields::KNOWN_ASSOCIATES),
            &FieldValue::StringArray(vec!["Bob".into(), "Thorne".into()])
        );
        assert_eq!(doc.get_str(fields::UPDATED_BY), Some("op@example.com"));
        assert!(doc.get_str(fields::UPDATED_AT).is_some());
    }

    #[test]
    fn test_self_reference_is_ignored() {
        let store = InMemoryStore::new();
        let session = store.verified_session("op@example.com");
        let thorne = thorne_with(&["thorne"]);
        seed(&store, &thorne);

        let report = link_associates(&store, &session, &thorne, Utc::now());
        assert_eq!(report.writes(), 0);
        assert!(report.is_complete());
        assert_eq!(store.write_count(Collection::Players), 0);
    }
}
