//! Core error types for studyroom-core.
//!
//! Most domain operations are total (unknown ids and invalid timer
//! transitions are no-ops), so these errors only come from the edges:
//! storage, configuration, the command channel and analytics export.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for studyroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Command channel errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Analytics export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Command channel errors.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Reading a slot failed
    #[error("Failed to read slot '{slot}': {message}")]
    ReadFailed { slot: String, message: String },

    /// Writing a slot failed
    #[error("Failed to write slot '{slot}': {message}")]
    WriteFailed { slot: String, message: String },
}

/// Analytics export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The remote stats store answered with a non-success status
    #[error("Stats store rejected update (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// The request could not be sent
    #[error("Stats store request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The stored record could not be merged
    #[error("Stats record for '{user_id}' is not a JSON object")]
    MalformedRecord { user_id: String },

    /// The local statistics table could not be read or written
    #[error("Local stats store failed: {0}")]
    Local(#[from] DatabaseError),

    /// A stored or returned document was not valid JSON
    #[error("Stats record is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
