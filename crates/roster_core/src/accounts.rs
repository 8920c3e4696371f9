//! Operator accounts: registration, sign-in and role lookup.
//!
//! Each account has a profile document in the `users` collection holding the
//! operator's role. New accounts start out `unverified`; promotion to `user`
//! happens outside this system.

use crate::document::{Document, Record};
use crate::error::{Result, RosterError};
use crate::store::{Authenticator, Collection, Credentials, DocumentStore, Role, Session};

const EMAIL: &str = "email";
const DISCORD: &str = "Discord";
const ROLE: &str = "role";

/// Profile stored at `users/<user id>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub email: String,
    pub discord: Option<String>,
    pub role: Role,
}

impl Record for UserProfile {
    const COLLECTION: Collection = Collection::Users;

    fn to_document(&self) -> Document {
        Document::new()
            .with(EMAIL, self.email.as_str())
            .with(DISCORD, self.discord.as_deref().unwrap_or(crate::player::NOT_APPLICABLE))
            .with(ROLE, self.role.as_str())
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let discord = doc
            .get_str(DISCORD)
            .map(str::trim)
            .filter(|d| !d.is_empty() && *d != crate::player::NOT_APPLICABLE)
            .map(String::from);

        Ok(Self {
            email: doc.get_str(EMAIL).unwrap_or_default().to_string(),
            discord,
            role: doc.get_str(ROLE).map(Role::parse).unwrap_or_default(),
        })
    }
}

/// Create an account and its `unverified` profile.
///
/// The returned session can sign in but cannot touch roster data until an
/// administrator changes the role.
pub fn register<A, S>(
    auth: &A,
    store: &S,
    credentials: &Credentials,
    discord: Option<&str>,
) -> Result<Session>
where
    A: Authenticator + ?Sized,
    S: DocumentStore + ?Sized,
{
    validate_credentials(credentials)?;
    let session = auth.sign_up(credentials)?;

    let profile = UserProfile {
        email: credentials.email.clone(),
        discord: discord
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from),
        role: Role::Unverified,
    };
    log::debug!("Assigning default role to user {}", session.user_id);
    store.put(
        &session,
        Collection::Users,
        &session.user_id,
        &profile.to_document(),
    )?;

    Ok(session.with_role(Role::Unverified))
}

/// Authenticate and fetch the operator role once.
///
/// The role is cached on the returned [`Session`]; no later call re-reads it.
pub fn sign_in<A, S>(auth: &A, store: &S, credentials: &Credentials) -> Result<Session>
where
    A: Authenticator + ?Sized,
    S: DocumentStore + ?Sized,
{
    validate_credentials(credentials)?;
    let session = auth.sign_in(credentials)?;
    let role = fetch_role(store, &session)?;
    log::info!("Signed in as {} (role: {})", session.email, role);
    Ok(session.with_role(role))
}

/// Read the role from the profile document.
///
/// A missing profile or role field means `unverified`.
pub fn fetch_role<S>(store: &S, session: &Session) -> Result<Role>
where
    S: DocumentStore + ?Sized,
{
    match store.get(session, Collection::Users, &session.user_id)? {
        Some(doc) => Ok(UserProfile::from_document(&doc)?.role),
        None => {
            log::warn!(
                "No profile document for user {}; treating role as unverified",
                session.user_id
            );
            Ok(Role::Unverified)
        }
    }
}

fn validate_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.email.trim().is_empty() {
        return Err(RosterError::validation("email cannot be empty"));
    }
    if credentials.password.is_empty() {
        return Err(RosterError::validation("password cannot be empty"));
    }
    Ok(())
}
