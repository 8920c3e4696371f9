//! Firestore REST backend.
//!
//! Talks to the identity-toolkit accounts API for sign-in and to the
//! Firestore v1 REST API for documents, using a blocking `reqwest` client.

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::{Authenticator, Collection, Credentials, DocumentStore, Session, StoreEndpoints};
use crate::document::Document;
use crate::error::{Result, RosterError};

/// Documents requested per listing page.
const PAGE_SIZE: u32 = 300;

/// Identity-toolkit sign-in / sign-up response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    /// Seconds, sent as a string
    #[serde(default)]
    expires_in: Option<String>,
}

/// One page of a collection listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Blocking client for a Firestore project.
#[derive(Debug, Clone)]
pub struct FirestoreClient {
    endpoints: StoreEndpoints,
    http: Client,
}

impl FirestoreClient {
    pub fn new(endpoints: StoreEndpoints) -> Self {
        Self {
            endpoints,
            http: Client::new(),
        }
    }

    pub fn endpoints(&self) -> &StoreEndpoints {
        &self.endpoints
    }

    fn authenticate(&self, method: &str, credentials: &Credentials) -> Result<Session> {
        let url = self.endpoints.auth_method_url(method);
        log::debug!("POST accounts:{} for {}", method, credentials.email);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
                "returnSecureToken": true,
            }))
            .send()
            .map_err(|e| RosterError::Auth(format!("could not reach auth service: {}", e)))?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if !status.is_success() {
            return Err(RosterError::Auth(auth_error_message(&body)));
        }

        let auth: AuthResponse = serde_json::from_str(&body)?;
        Ok(session_from_auth(auth, &credentials.email))
    }

    fn send(&self, session: &Session, request: RequestBuilder) -> Result<Response> {
        session.ensure_valid()?;
        request
            .bearer_auth(&session.token)
            .send()
            .map_err(|e| RosterError::store(None, e.to_string()))
    }
}

impl Authenticator for FirestoreClient {
    fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate("signInWithPassword", credentials)
    }

    fn sign_up(&self, credentials: &Credentials) -> Result<Session> {
        self.authenticate("signUp", credentials)
    }
}

impl DocumentStore for FirestoreClient {
    fn get(
        &self,
        session: &Session,
        collection: Collection,
        key: &str,
    ) -> Result<Option<Document>> {
        let url = self.endpoints.document_url(collection, key);
        log::debug!("GET {}/{}", collection, key);

        let response = self.send(session, self.http.get(&url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = read_success(response)?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    fn put(
        &self,
        session: &Session,
        collection: Collection,
        key: &str,
        doc: &Document,
    ) -> Result<()> {
        // PATCH without an update mask replaces the whole document.
        let url = self.endpoints.document_url(collection, key);
        log::debug!("PATCH {}/{}", collection, key);

        let response = self.send(session, self.http.patch(&url).json(&doc.to_write_body()))?;
        read_success(response)?;
        Ok(())
    }

    fn append(&self, session: &Session, collection: Collection, doc: &Document) -> Result<String> {
        let url = self.endpoints.collection_url(collection);
        log::debug!("POST {}", collection);

        let response = self.send(session, self.http.post(&url).json(&doc.to_write_body()))?;
        let body = read_success(response)?;
        let created: Document = serde_json::from_str(&body)?;
        Ok(created.key().unwrap_or_default().to_string())
    }

    fn list_all(&self, session: &Session, collection: Collection) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let url = self
                .endpoints
                .list_url(collection, PAGE_SIZE, page_token.as_deref());
            log::debug!("GET {} (page {})", collection, page_token.is_some());

            let response = self.send(session, self.http.get(&url))?;
            let page: ListPage = parse_list_page(&read_success(response)?)?;
            documents.extend(page.documents);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        log::debug!("Loaded {} documents from {}", documents.len(), collection);
        Ok(documents)
    }
}

/// Return the body of a successful response, or map the failure.
fn read_success(response: Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|e| RosterError::store(Some(status.as_u16()), e.to_string()))?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(status_error(status.as_u16(), body))
    }
}

/// Map a non-success status to the error taxonomy.
fn status_error(status: u16, body: String) -> RosterError {
    match status {
        401 => RosterError::Auth(auth_error_message(&body)),
        _ => RosterError::store(Some(status), body),
    }
}

/// Pull `error.message` out of a Google API error body.
fn auth_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

fn session_from_auth(auth: AuthResponse, fallback_email: &str) -> Session {
    let mut session = Session::new(
        auth.id_token,
        auth.local_id,
        auth.email.unwrap_or_else(|| fallback_email.to_string()),
    );
    if let Some(seconds) = auth.expires_in.and_then(|s| s.parse::<i64>().ok()) {
        session = session.with_expiry(Utc::now() + Duration::seconds(seconds));
    }
    session
}

/// An empty collection comes back as `{}`.
fn parse_list_page(body: &str) -> Result<ListPage> {
    if body.trim().is_empty() {
        return Ok(ListPage::default());
    }
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Role;

    #[test]
    fn test_auth_error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"INVALID_PASSWORD","errors":[]}}"#;
        assert_eq!(auth_error_message(body), "INVALID_PASSWORD");
        assert_eq!(auth_error_message("gateway timeout\n"), "gateway timeout");
    }

    #[test]
    fn test_status_mapping() {
        assert!(status_error(401, "{}".into()).requires_login());
        match status_error(503, "unavailable".into()) {
            RosterError::Store { status, message } => {
                assert_eq!(status, Some(503));
                assert_eq!(message, "unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_session_from_auth_response() {
        let auth: AuthResponse = serde_json::from_str(
            r#"{"idToken":"tok","localId":"uid-7","email":"op@example.com","expiresIn":"3600"}"#,
        )
        .unwrap();
        let session = session_from_auth(auth, "fallback@example.com");
        assert_eq!(session.user_id, "uid-7");
        assert_eq!(session.email, "op@example.com");
        assert_eq!(session.role, Role::Unverified);
        assert!(session.expires_at.unwrap() > Utc::now());
    }

    #[test]
    fn test_list_page_parsing() {
        let page = parse_list_page("{}").unwrap();
        assert!(page.documents.is_empty());
        assert!(page.next_page_token.is_none());

        let page = parse_list_page(
            r#"{"documents":[{"name":"projects/p/databases/(default)/documents/players/thorne",
                "fields":{"Name":{"stringValue":"Thorne"}}}],"nextPageToken":"abc"}"#,
        )
        .unwrap();
        assert_eq!(page.documents[0].key(), Some("thorne"));
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
    }
}
