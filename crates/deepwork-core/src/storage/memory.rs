//! In-memory session store.
//!
//! No durability; used by tests and by callers that only need the engine's
//! in-process lifecycle guarantees.

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::error::StoreError;
use crate::session::Session;

use super::SessionStore;

/// A `SessionStore` backed by a plain map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
            .insert(session.id(), session.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        let sessions = self
            .sessions
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(sessions.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn save_replaces_previous_snapshot() {
        let store = MemoryStore::new();
        let session = Session::new("a".into(), "b".into(), 25, Utc::now());
        store.save(&session).unwrap();
        store.save(&session).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
