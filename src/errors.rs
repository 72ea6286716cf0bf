//! Unified error type for the ledger engine, the persistence layer and the binary.

use thiserror::Error;

/// All failures the crate can report.
///
/// Each category is a distinct variant so callers can tell an invalid argument
/// from a missing entity or a failed write.
#[derive(Debug, Error)]
pub enum Error {
    /// A negative amount was passed to a strict credit or debit.
    #[error("Invalid amount: {amount} (amounts must not be negative)")]
    InvalidAmount {
        /// The rejected amount in cents
        amount: i64,
    },

    /// No person with this id exists in the ledger.
    #[error("Person not found: {id}")]
    PersonNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// No saved event with this id exists.
    #[error("Event not found: {id}")]
    EventNotFound {
        /// The id that was looked up
        id: i64,
    },

    /// The tracker committed something after the editor was opened; the edit
    /// must be redone.
    ///
    /// The check is tracker-wide: any commit, including adding a person or
    /// saving a different event, makes every editor opened before it stale.
    #[error("Event {event_id} was edited against an outdated ledger")]
    StaleEdit {
        /// The event being edited (0 for an unsaved event)
        event_id: i64,
    },

    /// A person name that is empty after trimming.
    #[error("Invalid person name: {name:?}")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// Bad or unreadable configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A snapshot document could not be parsed or imported.
    #[error("Snapshot error: {message}")]
    Snapshot {
        /// What went wrong
        message: String,
    },

    /// Persistence failure reported by the database.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure (configuration or snapshot files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Snapshot {
            message: value.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
