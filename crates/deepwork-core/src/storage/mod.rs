//! Session persistence and configuration.
//!
//! The engine owns its records in memory; a [`SessionStore`] is the durable
//! copy behind it. Stores are write-through: the engine persists a session's
//! next state before committing it to the shared record, so a failed write
//! never leaves a half-applied transition.

mod config;
mod memory;
mod sqlite;

pub use config::EngineConfig;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::StoreError;
use crate::session::Session;

/// Durable storage for session records.
///
/// `save` must persist the full record atomically -- either every field of
/// the given snapshot lands or none does. Transient failures are retried by
/// the engine up to its configured budget.
pub trait SessionStore: Send + Sync {
    /// Persist one session snapshot, replacing any previous version.
    fn save(&self, session: &Session) -> Result<(), StoreError>;

    /// Load every persisted session.
    fn load_all(&self) -> Result<Vec<Session>, StoreError>;
}

/// Returns `~/.config/deepwork[-dev]/` based on DEEPWORK_ENV.
///
/// Set DEEPWORK_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DEEPWORK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("deepwork-dev")
    } else {
        base_dir.join("deepwork")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
