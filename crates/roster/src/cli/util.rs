//! Shared utilities for CLI commands

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use roster_core::RosterApp;
use roster_core::config::Config;
use roster_core::error::{ErrorKind, RosterError};
use roster_core::store::{FirestoreClient, Session};

/// The app type every roster command runs against.
pub type CliApp = RosterApp<FirestoreClient>;

/// Environment variable consulted before prompting for a password
pub const PASSWORD_ENV: &str = "ROSTER_PASSWORD";

/// Load config or print error message
pub fn load_config() -> Option<Config> {
    match Config::load() {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("✗ Error loading config: {}", e);
            None
        }
    }
}

/// Persist config, printing a warning on failure.
pub fn save_config(config: &Config) -> bool {
    match config.save() {
        Ok(()) => true,
        Err(e) => {
            eprintln!("✗ Could not save config: {}", e);
            false
        }
    }
}

/// Build a store client from the configured endpoints.
pub fn client(config: &Config) -> Option<FirestoreClient> {
    match config.store_endpoints() {
        Ok(endpoints) => Some(FirestoreClient::new(endpoints)),
        Err(e) => {
            report_error(&e);
            None
        }
    }
}

/// Build the app for the cached session, or explain why there is none.
pub fn connect() -> Option<CliApp> {
    let config = load_config()?;
    let Some(session) = config.session.clone() else {
        report_error(&RosterError::NotAuthenticated);
        return None;
    };
    if let Err(e) = session.ensure_valid() {
        report_error(&e);
        return None;
    }
    let client = client(&config)?;
    log::debug!("Using cached session for {}", session.email);
    Some(RosterApp::new(client, session))
}

/// Print an error with a hint for the operator.
pub fn report_error(error: &RosterError) {
    eprintln!("✗ {}", error);
    match error.kind() {
        ErrorKind::Auth if !matches!(error, RosterError::NotAuthenticated) => {
            eprintln!("  Run 'roster login' to sign in again.");
        }
        ErrorKind::Permission => {
            eprintln!("  An administrator has to verify your account first.");
        }
        _ => {}
    }
}

/// Password from the flag, the environment, or a prompt.
pub fn read_password(flag: Option<String>) -> Option<String> {
    if let Some(password) = flag {
        return Some(password);
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV)
        && !password.is_empty()
    {
        return Some(password);
    }

    print!("Password: ");
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    match io::stdin().read_line(&mut input) {
        Ok(_) => Some(input.trim_end_matches(['\r', '\n']).to_string()),
        Err(e) => {
            eprintln!("✗ Could not read password: {}", e);
            None
        }
    }
}

/// Short UTC timestamp for listings.
pub fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// One-line description of a session.
pub fn describe_session(session: &Session) -> String {
    format!("{} (role: {})", session.email, session.role)
}
