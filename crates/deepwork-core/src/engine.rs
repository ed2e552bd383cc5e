//! The session lifecycle engine.
//!
//! [`Engine`] is the facade every external collaborator talks to: it
//! composes the transition machinery, the time accounting, and the store
//! behind the operation set `create` / `get` / `transition` / `history`.
//! The sweeper drives its auto-transitions through the same per-session
//! lock as client calls.
//!
//! ## Locking discipline
//!
//! One `tokio::sync::RwLock` per session record, handles shared through an
//! outer map lock. The map lock is held only to look up or insert a handle,
//! never across a transition, so a stuck transition on one session cannot
//! stall another. A transition takes its session's write lock for the whole
//! check-apply-persist sequence; reads take the read lock and always see a
//! pre- or post-transition snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::machine::{self, TransitionEvent};
use crate::session::{Session, SessionStatus, SessionView};
use crate::stats::{self, HistoryReport};
use crate::storage::{EngineConfig, SessionStore};

type SessionHandle = Arc<RwLock<Session>>;

/// Authoritative session-lifecycle engine.
pub struct Engine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    store: Arc<dyn SessionStore>,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl Engine {
    /// Build an engine over `store`, loading every persisted session.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut sessions = HashMap::new();
        for session in store.load_all()? {
            sessions.insert(session.id(), Arc::new(RwLock::new(session)));
        }
        Ok(Self {
            config,
            clock,
            store,
            sessions: RwLock::new(sessions),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create a new `planned` session.
    ///
    /// # Errors
    /// Rejects a scheduled duration outside the configured bounds. Title and
    /// goal are opaque here; content validation belongs to the transport.
    pub async fn create(
        &self,
        title: impl Into<String>,
        goal: impl Into<String>,
        scheduled_duration: u64,
    ) -> Result<SessionView> {
        if scheduled_duration < self.config.min_duration_min
            || scheduled_duration > self.config.max_duration_min
        {
            return Err(EngineError::InvalidDuration {
                minutes: scheduled_duration,
                min: self.config.min_duration_min,
                max: self.config.max_duration_min,
            });
        }

        let now = self.clock.now();
        let session = Session::new(title.into(), goal.into(), scheduled_duration, now);
        self.persist(&session)?;

        let view = SessionView::of(&session, now);
        self.sessions
            .write()
            .await
            .insert(session.id(), Arc::new(RwLock::new(session)));
        tracing::debug!(id = %view.id, "created session");
        Ok(view)
    }

    /// Snapshot one session as of now.
    pub async fn get(&self, id: Uuid) -> Result<SessionView> {
        let handle = self.handle(id).await?;
        let session = handle.read().await;
        Ok(SessionView::of(&session, self.clock.now()))
    }

    /// Apply a client-driven transition.
    ///
    /// The session's write lock is held across check, mutation, and persist;
    /// of two racing requests, only the one that wins the lock has its
    /// precondition checked against the pre-transition status.
    pub async fn transition(&self, id: Uuid, event: TransitionEvent) -> Result<SessionView> {
        let handle = self.handle(id).await?;
        let mut session = handle.write().await;
        let now = self.clock.now();

        // Mutate a scratch copy; the shared record changes only once the
        // store has accepted the new state.
        let mut next = session.clone();
        machine::apply(&mut next, &event, now)?;
        self.persist(&next)?;

        tracing::debug!(
            %id,
            event = event.name(),
            from = %session.status(),
            to = %next.status(),
            "applied transition"
        );
        *session = next;
        Ok(SessionView::of(&session, now))
    }

    /// Evaluate and, if warranted, apply one auto-transition for `id`.
    ///
    /// Sweeper entry point; goes through the same per-session write lock as
    /// client transitions. Returns the new status if one was applied.
    pub(crate) async fn sweep_session(&self, id: Uuid) -> Result<Option<SessionStatus>> {
        let handle = self.handle(id).await?;
        let mut session = handle.write().await;
        let now = self.clock.now();

        let Some(auto) = machine::evaluate_auto(&session, now, &self.config) else {
            return Ok(None);
        };

        let mut next = session.clone();
        machine::apply_auto(&mut next, auto, now)?;
        self.persist(&next)?;

        let status = next.status();
        *session = next;
        Ok(Some(status))
    }

    /// Ids of sessions still eligible for auto-transitions.
    pub async fn non_terminal_ids(&self) -> Vec<Uuid> {
        let handles: Vec<(Uuid, SessionHandle)> = {
            let map = self.sessions.read().await;
            map.iter().map(|(id, h)| (*id, h.clone())).collect()
        };
        let mut ids = Vec::new();
        for (id, handle) in handles {
            if !handle.read().await.status().is_terminal() {
                ids.push(id);
            }
        }
        ids
    }

    /// All sessions in reverse-creation order, with the aggregate counters.
    pub async fn history(&self) -> HistoryReport {
        let handles: Vec<SessionHandle> = {
            let map = self.sessions.read().await;
            map.values().cloned().collect()
        };
        let now = self.clock.now();
        let mut views = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = handle.read().await;
            views.push(SessionView::of(&session, now));
        }
        views.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        let summary = stats::summarize(&views);
        HistoryReport {
            sessions: views,
            summary,
        }
    }

    async fn handle(&self, id: Uuid) -> Result<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::NotFound(id))
    }

    /// Write-through with a bounded retry budget. State is only committed to
    /// the shared record after this succeeds, so a failed transition leaves
    /// the session exactly as it was.
    fn persist(&self, session: &Session) -> Result<()> {
        let attempts = self.config.store_write_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.save(session) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        id = %session.id(),
                        attempt,
                        attempts,
                        error = %e,
                        "store write failed, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
