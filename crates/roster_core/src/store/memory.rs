//! In-memory document store.
//!
//! Implements both [`Authenticator`] and [`DocumentStore`] over shared state,
//! so clones observe the same documents. Used by tests and offline demos; it
//! can also inject failures for individual documents.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;

use super::{Authenticator, Collection, Credentials, DocumentStore, Role, Session};
use crate::accounts::UserProfile;
use crate::document::{Document, Record};
use crate::error::{Result, RosterError};

#[derive(Default)]
struct State {
    collections: HashMap<Collection, IndexMap<String, Document>>,
    /// email -> (password, user id)
    accounts: HashMap<String, (String, String)>,
    tokens: HashSet<String>,
    writes: HashMap<Collection, usize>,
    failing_reads: HashSet<(Collection, String)>,
    failing_writes: HashSet<(Collection, String)>,
    failing_appends: HashSet<Collection>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }

    fn issue_session(&mut self, user_id: &str, email: &str) -> Session {
        let token = self.next_id("token");
        self.tokens.insert(token.clone());
        Session::new(token, user_id, email)
    }

    fn authorize(&self, session: &Session) -> Result<()> {
        session.ensure_valid()?;
        if !self.tokens.contains(&session.token) {
            return Err(RosterError::Auth("INVALID_ID_TOKEN".to_string()));
        }
        Ok(())
    }
}

/// A process-local document store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicked test thread must not hide the store from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a document directly, bypassing sessions and write counters.
    pub fn insert(&self, collection: Collection, key: &str, doc: Document) {
        self.lock()
            .collections
            .entry(collection)
            .or_default()
            .insert(key.to_string(), doc);
    }

    /// Read a document directly (for assertions).
    pub fn document(&self, collection: Collection, key: &str) -> Option<Document> {
        self.lock()
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(key))
            .cloned()
    }

    /// Number of documents in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.lock()
            .collections
            .get(&collection)
            .map_or(0, IndexMap::len)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    /// Number of successful writes (`put` + `append`) to a collection.
    pub fn write_count(&self, collection: Collection) -> usize {
        self.lock().writes.get(&collection).copied().unwrap_or(0)
    }

    /// Make every read of this document fail with a store error.
    pub fn fail_reads_for(&self, collection: Collection, key: &str) {
        self.lock()
            .failing_reads
            .insert((collection, key.to_string()));
    }

    /// Make every write of this document fail with a store error.
    pub fn fail_writes_for(&self, collection: Collection, key: &str) {
        self.lock()
            .failing_writes
            .insert((collection, key.to_string()));
    }

    /// Make every append to this collection fail with a store error.
    pub fn fail_appends_to(&self, collection: Collection) {
        self.lock().failing_appends.insert(collection);
    }

    /// Invalidate every issued token, as if all sessions expired server-side.
    pub fn revoke_all_sessions(&self) {
        self.lock().tokens.clear();
    }

    /// Register (if needed) an account, mark it verified and return a session
    /// with the `user` role already cached.
    pub fn verified_session(&self, email: &str) -> Session {
        let mut state = self.lock();
        let user_id = match state.accounts.get(email) {
            Some((_, uid)) => uid.clone(),
            None => {
                let uid = state.next_id("uid");
                state
                    .accounts
                    .insert(email.to_string(), (String::new(), uid.clone()));
                uid
            }
        };

        let profile = UserProfile {
            email: email.to_string(),
            discord: None,
            role: Role::User,
        };
        state
            .collections
            .entry(Collection::Users)
            .or_default()
            .insert(user_id.clone(), profile.to_document());

        state.issue_session(&user_id, email).with_role(Role::User)
    }
}

impl Authenticator for InMemoryStore {
    fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        let mut state = self.lock();
        let user_id = match state.accounts.get(&credentials.email) {
            Some((password, uid)) if *password == credentials.password => uid.clone(),
            Some(_) => return Err(RosterError::Auth("INVALID_PASSWORD".to_string())),
            None => return Err(RosterError::Auth("EMAIL_NOT_FOUND".to_string())),
        };
        Ok(state.issue_session(&user_id, &credentials.email))
    }

    fn sign_up(&self, credentials: &Credentials) -> Result<Session> {
        let mut state = self.lock();
        if state.accounts.contains_key(&credentials.email) {
            return Err(RosterError::Auth("EMAIL_EXISTS".to_string()));
        }
        if credentials.password.len() < 6 {
            return Err(RosterError::Auth(
                "WEAK_PASSWORD : Password should be at least 6 characters".to_string(),
            ));
        }
        let user_id = state.next_id("uid");
        state.accounts.insert(
            credentials.email.clone(),
            (credentials.password.clone(), user_id.clone()),
        );
        Ok(state.issue_session(&user_id, &credentials.email))
    }
}

impl DocumentStore for InMemoryStore {
    fn get(
        &self,
        session: &Session,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>> {
        let state = self.lock();
        state.authorize(session)?;
        if state
            .failing_reads
            .contains(&(collection, key.to_string()))
        {
            return Err(RosterError::store(
                Some(500),
                format!("read of {}/{} failed", collection, key),
            ));
        }
        Ok(state
            .collections
            .get(&collection)
            .and_then(|docs| docs.get(key))
            .cloned())
    }

    fn put(
        &self,
        session: &Session,
        collection: Collection,
        key: &str,
        doc: &Document,
    ) -> Result<()> {
        let mut state = self.lock();
        state.authorize(session)?;
        if state
            .failing_writes
            .contains(&(collection, key.to_string()))
        {
            return Err(RosterError::store(
                Some(500),
                format!("write of {}/{} failed", collection, key),
            ));
        }

        let mut stored = doc.clone();
        stored.name = Some(format!("{}/{}", collection, key));
        state
            .collections
            .entry(collection)
            .or_default()
            .insert(key.to_string(), stored);
        *state.writes.entry(collection).or_default() += 1;
        Ok(())
    }

    fn append(&self, session: &Session, collection: Collection, doc: &Document) -> Result<String> {
        let mut state = self.lock();
        state.authorize(session)?;
        if state.failing_appends.contains(&collection) {
            return Err(RosterError::store(
                Some(500),
                format!("append to {} failed", collection),
            ));
        }
        let key = state.next_id(collection.as_str());

        let mut stored = doc.clone();
        stored.name = Some(format!("{}/{}", collection, key));
        state
            .collections
            .entry(collection)
            .or_default()
            .insert(key.clone(), stored);
        *state.writes.entry(collection).or_default() += 1;
        Ok(key)
    }

    fn list_all(&self, session: &Session, collection: Collection) -> Result<Vec<Document>> {
        let state = self.lock();
        state.authorize(session)?;
        Ok(state
            .collections
            .get(&collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }
}
