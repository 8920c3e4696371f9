//! Remote service locations.

use serde::{Deserialize, Serialize};

use super::Collection;

/// Default identity-toolkit accounts endpoint
pub const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts";

/// Default Firestore REST root
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Where the authentication and document services live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreEndpoints {
    /// Accounts endpoint, without the `:method` suffix
    pub auth_url: String,
    /// Collection root: `.../projects/<id>/databases/(default)/documents`
    pub documents_url: String,
    pub api_key: String,
}

impl StoreEndpoints {
    /// Endpoints for a Firestore project.
    pub fn for_project(project_id: &str, api_key: &str) -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                DEFAULT_FIRESTORE_URL,
                urlencoding::encode(project_id)
            ),
            api_key: api_key.to_string(),
        }
    }

    /// Identity-toolkit call such as `signInWithPassword` or `signUp`.
    pub fn auth_method_url(&self, method: &str) -> String {
        format!(
            "{}:{}?key={}",
            self.auth_url.trim_end_matches('/'),
            method,
            urlencoding::encode(&self.api_key)
        )
    }

    pub fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.documents_url.trim_end_matches('/'), collection)
    }

    pub fn document_url(&self, collection: Collection, key: &str) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(key)
        )
    }

    /// One page of a collection listing.
    pub fn list_url(&self, collection: Collection, page_size: u32, page_token: Option<&str>) -> String {
        let mut url = format!("{}?pageSize={}", self.collection_url(collection), page_size);
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }
}
