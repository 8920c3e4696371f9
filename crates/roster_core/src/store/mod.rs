//! Document store abstraction.
//!
//! This module provides the [`DocumentStore`] and [`Authenticator`] traits that
//! stand between the roster logic and the remote database, plus the
//! [`Session`] every store call is made with.
//!
//! Backends:
//!
//! - [`InMemoryStore`]: process-local store used by tests and demos
//! - [`FirestoreClient`]: REST backend over a blocking HTTP client (requires `http` feature)
//!
//! All calls are synchronous and block until the round-trip completes. There
//! is no retry; failures surface to the caller immediately.

mod endpoints;
mod memory;
#[cfg(feature = "http")]
mod rest;

pub use endpoints::{DEFAULT_AUTH_URL, DEFAULT_FIRESTORE_URL, StoreEndpoints};
pub use memory::InMemoryStore;
#[cfg(feature = "http")]
pub use rest::FirestoreClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{Result, RosterError};

/// Collections used by the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Player records, keyed by lowercased player name
    Players,
    /// Append-only audit log, auto-keyed
    Logs,
    /// Account profiles holding the operator role, keyed by user id
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Players => "players",
            Collection::Logs => "logs",
            Collection::Users => "users",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator role stored in the account profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Freshly registered, waiting for an administrator
    #[default]
    Unverified,
    /// Verified operator, may read and write roster data
    User,
}

impl Role {
    /// Parse a stored role. Anything other than `user` is unverified.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Unverified
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Unverified => "unverified",
            Role::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sign-in credentials.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// An authenticated operator session.
///
/// Passed explicitly to every store call. The role is fetched once after
/// sign-in (see [`crate::accounts::sign_in`]) and cached here.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for store requests
    pub token: String,
    /// Stable account id
    pub user_id: String,
    /// Operator identity recorded in `updatedBy` and log entries
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        token: impl Into<String>,
        user_id: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
            email: email.into(),
            role: Role::Unverified,
            expires_at: None,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Fail with an auth error unless the session can be used for a request.
    pub fn ensure_valid(&self) -> Result<()> {
        if self.token.is_empty() {
            return Err(RosterError::NotAuthenticated);
        }
        if let Some(expires_at) = self.expires_at
            && expires_at <= Utc::now()
        {
            return Err(RosterError::SessionExpired);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Guard for roster data: only verified operators may read or write
/// player and log documents.
pub fn check_permission(session: &Session) -> Result<()> {
    session.ensure_valid()?;
    match session.role {
        Role::User => Ok(()),
        role => Err(RosterError::PermissionDenied(role)),
    }
}

/// Credential-based sign-in and sign-up.
pub trait Authenticator {
    /// Authenticate an existing account. Fails with [`RosterError::Auth`] on
    /// bad credentials or network failure.
    fn sign_in(&self, credentials: &Credentials) -> Result<Session>;

    /// Create a new account and return its first session.
    fn sign_up(&self, credentials: &Credentials) -> Result<Session>;
}

/// Authenticated CRUD access to document collections.
///
/// Every method fails with an auth error when the session is missing or
/// expired, and with [`RosterError::Store`] on any non-success response.
pub trait DocumentStore {
    /// Fetch one document. `Ok(None)` when it does not exist.
    fn get(&self, session: &Session, collection: Collection, key: &str)
    -> Result<Option<Document>>;

    /// Create or fully replace a document (no partial-field patch).
    fn put(&self, session: &Session, collection: Collection, key: &str, doc: &Document)
    -> Result<()>;

    /// Create a document under a store-assigned key and return that key.
    fn append(&self, session: &Session, collection: Collection, doc: &Document) -> Result<String>;

    /// Fetch every document in a collection.
    fn list_all(&self, session: &Session, collection: Collection) -> Result<Vec<Document>>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn get(
        &self,
        session: &Session,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>> {
        (**self).get(session, collection, key)
    }

    fn put(
        &self,
        session: &Session,
        collection: Collection,
        key: &str,
        doc: &Document,
    ) -> Result<()> {
        (**self).put(session, collection, key, doc)
    }

    fn append(&self, session: &Session, collection: Collection, doc: &Document) -> Result<String> {
        (**self).append(session, collection, doc)
    }

    fn list_all(&self, session: &Session, collection: Collection) -> Result<Vec<Document>> {
        (**self).list_all(session, collection)
    }
}

impl<T: Authenticator + ?Sized> Authenticator for &T {
    fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        (**self).sign_in(credentials)
    }

    fn sign_up(&self, credentials: &Credentials) -> Result<Session> {
        (**self).sign_up(credentials)
    }
}
