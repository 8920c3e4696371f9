//! Configuration types for Roster.
//!
//! This module provides the [`Config`] struct which stores the store
//! connection settings, the export location and the cached sign-in session.
//! Configuration is persisted as TOML (typically at
//! `~/.config/roster/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `project_id` / `api_key`: the document store project
//! - `auth_url` / `database_url`: endpoint overrides (emulators, proxies)
//! - `export_root`: where `roster export` writes by default
//! - `session`: written by `roster login`, cleared by `roster logout`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RosterError};
use crate::store::{DEFAULT_AUTH_URL, Session, StoreEndpoints};

/// Settings the operator can configure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Store project id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// Web API key for the auth service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Accounts endpoint
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    /// Full documents URL, overriding the one derived from `project_id`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Default export destination
    #[serde(default = "default_export_root")]
    pub export_root: PathBuf,

    /// Session cached by the last login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}

fn default_export_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("roster-export")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            auth_url: default_auth_url(),
            database_url: None,
            export_root: default_export_root(),
            session: None,
        }
    }
}

impl Config {
    /// Endpoints for the configured project.
    ///
    /// Fails with [`RosterError::ConfigIncomplete`] naming the first missing key.
    pub fn store_endpoints(&self) -> Result<StoreEndpoints> {
        let api_key = non_empty(self.api_key.as_deref())
            .ok_or(RosterError::ConfigIncomplete("api_key"))?;

        let mut endpoints = match non_empty(self.database_url.as_deref()) {
            Some(url) => StoreEndpoints {
                auth_url: String::new(),
                documents_url: url.to_string(),
                api_key: api_key.to_string(),
            },
            None => {
                let project = non_empty(self.project_id.as_deref())
                    .ok_or(RosterError::ConfigIncomplete("project_id"))?;
                StoreEndpoints::for_project(project, api_key)
            }
        };
        endpoints.auth_url = self.auth_url.clone();
        Ok(endpoints)
    }

    /// Set a key by name (used by `roster config set`).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());
        match key {
            "project_id" => self.project_id = optional(),
            "api_key" => self.api_key = optional(),
            "auth_url" => {
                self.auth_url = optional().unwrap_or_else(default_auth_url);
            }
            "database_url" => self.database_url = optional(),
            "export_root" => {
                self.export_root = optional()
                    .map(PathBuf::from)
                    .unwrap_or_else(default_export_root);
            }
            other => {
                return Err(RosterError::Validation(format!(
                    "unknown config key '{}' (expected project_id, api_key, auth_url, database_url or export_root)",
                    other
                )));
            }
        }
        Ok(())
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|source| RosterError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the config file path (~/.config/roster/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("roster").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }

        Ok(Config::default())
    }

    /// Save config to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(RosterError::NoConfigDir)?;
        self.save_to(&path)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Role;

    #[test]
    fn test_missing_keys_are_reported() {
        let mut config = Config::default();
        assert!(matches!(
            config.store_endpoints(),
            Err(RosterError::ConfigIncomplete("api_key"))
        ));

        config.api_key = Some("k".into());
        assert!(matches!(
            config.store_endpoints(),
            Err(RosterError::ConfigIncomplete("project_id"))
        ));

        config.project_id = Some("ashes-roster".into());
        let endpoints = config.store_endpoints().unwrap();
        assert!(endpoints.documents_url.contains("/projects/ashes-roster/"));
        assert_eq!(endpoints.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_database_url_override() {
        let mut config = Config::default();
        config.set("api_key", "k").unwrap();
        config
            .set("database_url", "http://localhost:8080/v1/projects/demo/databases/(default)/documents")
            .unwrap();
        config.set("auth_url", "http://localhost:9099/v1/accounts").unwrap();

        let endpoints = config.store_endpoints().unwrap();
        assert!(endpoints.documents_url.starts_with("http://localhost:8080"));
        assert_eq!(
            endpoints.auth_method_url("signUp"),
            "http://localhost:9099/v1/accounts:signUp?key=k"
        );
    }

    #[test]
    fn test_set_rejects_unknown_key() {
        let mut config = Config::default();
        assert!(config.set("colour", "blue").is_err());
        config.set("project_id", "  ").unwrap();
        assert!(config.project_id.is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.project_id = Some("ashes-roster".into());
        config.api_key = Some("k".into());
        config.export_root = PathBuf::from("/tmp/roster-out");
        config.session =
            Some(Session::new("tok", "uid-1", "op@example.com").with_role(Role::User));

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.session.unwrap().role, Role::User);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "project_id = \"p\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("p"));
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert!(config.session.is_none());
    }
}
