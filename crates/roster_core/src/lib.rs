#![doc = include_str!("../README.md")]

/// Operator accounts (registration, sign-in, role lookup)
pub mod accounts;

/// Application service tying the workflows together
pub mod app;

/// Audit log entries
pub mod audit;

/// Field-level change tracking
pub mod changes;

/// Configuration options
#[cfg(not(target_arch = "wasm32"))]
pub mod config;

/// Tagged-value documents and the record codec
pub mod document;

/// Error (common error types)
pub mod error;

/// Export (cross-linked markdown views of the roster)
pub mod export;

/// Filesystem abstraction
pub mod fs;

/// Reciprocal known-associate links
pub mod links;

/// Player records and form validation
pub mod player;

/// Roster filtering and sorting
pub mod query;

/// Document store boundary (traits, sessions, backends)
pub mod store;

#[cfg(test)]
pub mod test_utils;

pub use app::{AddOutcome, RosterApp, UpdateOutcome};
pub use error::{ErrorKind, Result, RosterError};
