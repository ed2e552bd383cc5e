//! Transition machinery.
//!
//! The only code that mutates a [`Session`]. Client-driven edges come in as
//! [`TransitionEvent`]s; time-based edges are [`AutoTransition`]s decided by
//! [`evaluate_auto`] and applied only through the sweep path. Every function
//! checks the session's *current* status before touching it, so whichever
//! caller wins the per-session lock is the one whose precondition counts.
//!
//! ## Client edges
//!
//! ```text
//! planned --start--> active --pause--> paused --resume--> active
//!                    active --complete--> completed
//!                    paused --complete--> completed
//! ```
//!
//! ## Auto edges (sweeper only, priority order)
//!
//! ```text
//! active  --productive >= scheduled--------------> overdue
//! active  --productive > scheduled * grace-------> interrupted
//! planned/paused --idle past abandonment timeout-> abandoned
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounting;
use crate::error::EngineError;
use crate::session::{Interruption, Session, SessionStatus};
use crate::storage::EngineConfig;

/// A client-requested transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TransitionEvent {
    Start,
    Pause { reason: String },
    Resume,
    Complete,
}

impl TransitionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionEvent::Start => "start",
            TransitionEvent::Pause { .. } => "pause",
            TransitionEvent::Resume => "resume",
            TransitionEvent::Complete => "complete",
        }
    }
}

/// A time-based transition the sweeper may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoTransition {
    Overdue,
    Interrupted,
    Abandoned,
}

impl AutoTransition {
    pub fn name(self) -> &'static str {
        match self {
            AutoTransition::Overdue => "overdue",
            AutoTransition::Interrupted => "interrupted",
            AutoTransition::Abandoned => "abandoned",
        }
    }
}

/// Apply a client-driven transition, or reject it leaving the session
/// untouched.
pub(crate) fn apply(
    session: &mut Session,
    event: &TransitionEvent,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let rejected = |session: &Session| EngineError::InvalidTransition {
        from: session.status(),
        event: event.name(),
    };

    match (session.status, event) {
        (SessionStatus::Planned, TransitionEvent::Start) => {
            session.start_time = Some(now);
            session.open_interval_at(now);
            session.status = SessionStatus::Active;
        }
        (SessionStatus::Active, TransitionEvent::Pause { reason }) => {
            if reason.trim().is_empty() {
                return Err(rejected(session));
            }
            session.close_interval_at(now);
            session.interruptions.push(Interruption {
                reason: reason.clone(),
                pause_time: now,
            });
            session.status = SessionStatus::Paused;
        }
        (SessionStatus::Paused, TransitionEvent::Resume) => {
            session.open_interval_at(now);
            session.status = SessionStatus::Active;
        }
        (SessionStatus::Active, TransitionEvent::Complete) => {
            session.close_interval_at(now);
            session.end_time = Some(now);
            session.status = SessionStatus::Completed;
        }
        (SessionStatus::Paused, TransitionEvent::Complete) => {
            session.end_time = Some(now);
            session.status = SessionStatus::Completed;
        }
        _ => return Err(rejected(session)),
    }
    session.last_transition_at = now;
    Ok(())
}

/// Decide which auto edge, if any, applies to `session` as of `now`.
///
/// Edges are checked in fixed priority order (overdue, interrupted,
/// abandoned); the first match wins, so a session receives at most one
/// auto-transition per sweep.
pub(crate) fn evaluate_auto(
    session: &Session,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Option<AutoTransition> {
    match session.status() {
        SessionStatus::Active => {
            let report = accounting::report(session, now);
            let scheduled = session.scheduled_duration() as f64;
            if report.productive_minutes >= scheduled {
                Some(AutoTransition::Overdue)
            } else if report.productive_minutes > scheduled * config.grace_multiplier {
                Some(AutoTransition::Interrupted)
            } else {
                None
            }
        }
        SessionStatus::Planned | SessionStatus::Paused => {
            let idle = now - session.last_transition_at();
            (idle > config.abandon_after()).then_some(AutoTransition::Abandoned)
        }
        _ => None,
    }
}

/// Apply an auto-transition, re-checking the from-status under the caller's
/// lock first.
pub(crate) fn apply_auto(
    session: &mut Session,
    auto: AutoTransition,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    let rejected = |session: &Session| EngineError::InvalidTransition {
        from: session.status(),
        event: auto.name(),
    };

    match (session.status, auto) {
        (SessionStatus::Active, AutoTransition::Overdue) => {
            session.close_interval_at(now);
            session.end_time = Some(now);
            session.status = SessionStatus::Overdue;
        }
        (SessionStatus::Active, AutoTransition::Interrupted) => {
            session.close_interval_at(now);
            session.end_time = Some(now);
            session.status = SessionStatus::Interrupted;
        }
        (SessionStatus::Planned | SessionStatus::Paused, AutoTransition::Abandoned) => {
            session.end_time = Some(now);
            session.status = SessionStatus::Abandoned;
        }
        _ => return Err(rejected(session)),
    }
    session.last_transition_at = now;
    Ok(())
}
