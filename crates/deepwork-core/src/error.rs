//! Core error types for deepwork-core.
//!
//! This module defines the error hierarchy using thiserror. Client-facing
//! failures (`EngineError`) are always propagated to the caller; sweep
//! failures are reported per session and never abort a sweep.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionStatus;

/// Engine-level error, surfaced by every public engine operation.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The requested event is not legal from the session's current status.
    ///
    /// Also covers a `pause` request with a blank reason.
    #[error("cannot {event} a {from} session")]
    InvalidTransition {
        from: SessionStatus,
        event: &'static str,
    },

    /// Unknown session id.
    #[error("session {0} not found")]
    NotFound(Uuid),

    /// Scheduled duration outside the configured bounds at creation.
    #[error("scheduled duration must be {min}..={max} minutes, got {minutes}")]
    InvalidDuration { minutes: u64, min: u64, max: u64 },

    /// Storage failure that survived the bounded retry budget.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Session store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing store.
    #[error("failed to open store at {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// Query or write execution failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// The store is temporarily unavailable (locked, busy). Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A persisted record could not be decoded.
    #[error("corrupt record for session {id}: {message}")]
    Corrupt { id: String, message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg)
                if e.code == rusqlite::ErrorCode::DatabaseLocked
                    || e.code == rusqlite::ErrorCode::DatabaseBusy =>
            {
                StoreError::Unavailable(e.to_string())
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for engine operations.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
