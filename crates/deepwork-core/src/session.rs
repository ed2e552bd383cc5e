//! Session model.
//!
//! A [`Session`] is one planned unit of timed focused work. Its fields are
//! only ever mutated by the transition machinery in [`crate::machine`]; the
//! rest of the crate (and everything outside it) sees read-only accessors
//! and derived [`SessionView`] snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounting;

/// Lifecycle status of a session.
///
/// A closed set -- no other status can reach storage or the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Planned,
    Active,
    Paused,
    Completed,
    Interrupted,
    Overdue,
    Abandoned,
}

impl SessionStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Completed
                | SessionStatus::Interrupted
                | SessionStatus::Overdue
                | SessionStatus::Abandoned
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Planned => "planned",
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Interrupted => "interrupted",
            SessionStatus::Overdue => "overdue",
            SessionStatus::Abandoned => "abandoned",
        }
    }

    /// Inverse of [`as_str`](Self::as_str), used when decoding stored rows.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(SessionStatus::Planned),
            "active" => Some(SessionStatus::Active),
            "paused" => Some(SessionStatus::Paused),
            "completed" => Some(SessionStatus::Completed),
            "interrupted" => Some(SessionStatus::Interrupted),
            "overdue" => Some(SessionStatus::Overdue),
            "abandoned" => Some(SessionStatus::Abandoned),
            _ => None,
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded pause with its caller-supplied reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interruption {
    pub reason: String,
    pub pause_time: DateTime<Utc>,
}

/// A contiguous span during which the session was active.
///
/// `ended_at` is `None` while the span is still open; at most one span is
/// open at a time, and only while the session status is `active`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityInterval {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ActivityInterval {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// One planned/executed unit of timed focused work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub(crate) id: Uuid,
    pub(crate) title: String,
    pub(crate) goal: String,
    /// Scheduled duration in minutes, fixed at creation.
    pub(crate) scheduled_duration: u64,
    pub(crate) status: SessionStatus,
    pub(crate) created_at: DateTime<Utc>,
    /// First transition into `active`; set once.
    pub(crate) start_time: Option<DateTime<Utc>>,
    /// Transition into a terminal status; set once.
    pub(crate) end_time: Option<DateTime<Utc>>,
    pub(crate) activity_intervals: Vec<ActivityInterval>,
    pub(crate) interruptions: Vec<Interruption>,
    /// Timestamp of the most recent accepted transition (creation time
    /// initially). Drives the abandonment timeout.
    pub(crate) last_transition_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(
        title: String,
        goal: String,
        scheduled_duration: u64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            goal,
            scheduled_duration,
            status: SessionStatus::Planned,
            created_at: now,
            start_time: None,
            end_time: None,
            activity_intervals: Vec::new(),
            interruptions: Vec::new(),
            last_transition_at: now,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn scheduled_duration(&self) -> u64 {
        self.scheduled_duration
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn activity_intervals(&self) -> &[ActivityInterval] {
        &self.activity_intervals
    }

    pub fn interruptions(&self) -> &[Interruption] {
        &self.interruptions
    }

    pub fn last_transition_at(&self) -> DateTime<Utc> {
        self.last_transition_at
    }

    /// The currently open activity interval, if any.
    pub fn open_interval(&self) -> Option<&ActivityInterval> {
        self.activity_intervals.last().filter(|i| i.is_open())
    }

    // ── Interval bookkeeping (transition machinery only) ─────────────

    /// Open a new activity interval at `now`.
    ///
    /// Caller guarantees no interval is currently open.
    pub(crate) fn open_interval_at(&mut self, now: DateTime<Utc>) {
        debug_assert!(self.open_interval().is_none());
        self.activity_intervals.push(ActivityInterval {
            started_at: now,
            ended_at: None,
        });
    }

    /// Close the open activity interval at `now`.
    ///
    /// Caller guarantees an interval is open.
    pub(crate) fn close_interval_at(&mut self, now: DateTime<Utc>) {
        if let Some(last) = self.activity_intervals.last_mut() {
            if last.ended_at.is_none() {
                last.ended_at = Some(now);
            }
        }
    }
}

/// The serialized shape of a session returned by every engine operation.
///
/// Mirrors the session's public fields and adds the derived time figures;
/// the raw interval log stays internal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub id: Uuid,
    pub title: String,
    pub goal: String,
    pub scheduled_duration: u64,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub interruptions: Vec<Interruption>,
    /// Sum of closed activity intervals plus the running open one, in minutes.
    pub productive_minutes: f64,
    /// Minutes since `start_time`, `None` before the session starts. Frozen
    /// at `end_time` for terminal sessions.
    pub elapsed_minutes: Option<f64>,
}

impl SessionView {
    /// Snapshot a session as of `now`.
    pub fn of(session: &Session, now: DateTime<Utc>) -> Self {
        let report = accounting::report(session, now);
        Self {
            id: session.id,
            title: session.title.clone(),
            goal: session.goal.clone(),
            scheduled_duration: session.scheduled_duration,
            status: session.status,
            created_at: session.created_at,
            start_time: session.start_time,
            end_time: session.end_time,
            interruptions: session.interruptions.clone(),
            productive_minutes: report.productive_minutes,
            elapsed_minutes: report.elapsed_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            SessionStatus::Planned,
            SessionStatus::Active,
            SessionStatus::Paused,
            SessionStatus::Completed,
            SessionStatus::Interrupted,
            SessionStatus::Overdue,
            SessionStatus::Abandoned,
        ] {
            assert_eq!(SessionStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::parse("running"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!SessionStatus::Planned.is_terminal());
        assert!(!SessionStatus::Active.is_terminal());
        assert!(!SessionStatus::Paused.is_terminal());
        assert!(SessionStatus::Completed.is_terminal());
        assert!(SessionStatus::Interrupted.is_terminal());
        assert!(SessionStatus::Overdue.is_terminal());
        assert!(SessionStatus::Abandoned.is_terminal());
    }

    #[test]
    fn new_session_is_planned_and_empty() {
        let now = Utc::now();
        let session = Session::new("Write docs".into(), "Draft section 1".into(), 25, now);
        assert_eq!(session.status(), SessionStatus::Planned);
        assert_eq!(session.created_at(), now);
        assert_eq!(session.last_transition_at(), now);
        assert!(session.start_time().is_none());
        assert!(session.end_time().is_none());
        assert!(session.activity_intervals().is_empty());
        assert!(session.interruptions().is_empty());
    }
}
