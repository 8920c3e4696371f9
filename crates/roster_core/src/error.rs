use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::store::Role;

/// Unified error type for roster operations
#[derive(Debug, Error)]
pub enum RosterError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Configuration incomplete: '{0}' is not set. Run 'roster config set {0} <value>'.")]
    ConfigIncomplete(&'static str),

    // Session errors
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not signed in. Run 'roster login' first.")]
    NotAuthenticated,

    #[error("Session expired. Run 'roster login' again.")]
    SessionExpired,

    #[error("Access denied: account role is '{0}', not verified yet")]
    PermissionDenied(Role),

    // Store errors
    #[error("Player '{0}' not found")]
    NotFound(String),

    #[error("Store request failed{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Store {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed document '{key}': {reason}")]
    MalformedDocument { key: String, reason: String },

    // Input errors
    #[error("Invalid input: {0}")]
    Validation(String),
}

/// Result type alias for roster operations
pub type Result<T> = std::result::Result<T, RosterError>;

/// Coarse classification of a [`RosterError`].
///
/// The presentation layer branches on this rather than on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Bad credentials or missing/expired session. Requires a new login.
    Auth,
    /// Signed in, but the account role may not touch roster data.
    Permission,
    /// Expected absence of a record.
    NotFound,
    /// Transport or server-side failure, surfaced verbatim.
    Store,
    /// Malformed operator input, caught before any store call.
    Validation,
    /// Local failures: files, config, serialization.
    Local,
}

impl RosterError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RosterError::Auth(_) | RosterError::NotAuthenticated | RosterError::SessionExpired => {
                ErrorKind::Auth
            }
            RosterError::PermissionDenied(_) => ErrorKind::Permission,
            RosterError::NotFound(_) => ErrorKind::NotFound,
            RosterError::Store { .. } | RosterError::MalformedDocument { .. } => ErrorKind::Store,
            RosterError::Validation(_) => ErrorKind::Validation,
            RosterError::Io(_)
            | RosterError::FileWrite { .. }
            | RosterError::Json(_)
            | RosterError::Yaml(_)
            | RosterError::ConfigParse(_)
            | RosterError::ConfigSerialize(_)
            | RosterError::NoConfigDir
            | RosterError::ConfigIncomplete(_) => ErrorKind::Local,
        }
    }

    /// Whether the operator has to sign in again before retrying.
    pub fn requires_login(&self) -> bool {
        self.kind() == ErrorKind::Auth
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        RosterError::Validation(message.into())
    }

    pub(crate) fn store(status: Option<u16>, message: impl Into<String>) -> Self {
        RosterError::Store {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_follows_taxonomy() {
        assert_eq!(RosterError::NotAuthenticated.kind(), ErrorKind::Auth);
        assert_eq!(RosterError::SessionExpired.kind(), ErrorKind::Auth);
        assert_eq!(
            RosterError::PermissionDenied(Role::Unverified).kind(),
            ErrorKind::Permission
        );
        assert_eq!(
            RosterError::NotFound("mira".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RosterError::store(Some(500), "boom").kind(),
            ErrorKind::Store
        );
        assert_eq!(
            RosterError::validation("bad level").kind(),
            ErrorKind::Validation
        );
        assert!(RosterError::Auth("INVALID_PASSWORD".into()).requires_login());
    }

    #[test]
    fn test_store_message_carries_status() {
        let err = RosterError::store(Some(503), "{\"error\":\"unavailable\"}");
        assert_eq!(
            err.to_string(),
            "Store request failed (503): {\"error\":\"unavailable\"}"
        );

        let err = RosterError::store(None, "connection refused");
        assert_eq!(err.to_string(), "Store request failed: connection refused");
    }
}
