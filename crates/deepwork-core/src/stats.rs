//! History statistics.
//!
//! A read-only fold over session snapshots. Works on [`SessionView`]s, so
//! the figures for each session are fixed at snapshot time; concurrent
//! transitions on other sessions cannot tear the result.

use serde::{Deserialize, Serialize};

use crate::session::{SessionStatus, SessionView};

/// Aggregate counters for the history view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub interrupted_sessions: u64,
    pub overdue_sessions: u64,
    pub abandoned_sessions: u64,
    /// Sum of every session's interruption count.
    pub total_interruptions: u64,
    /// Sum of every session's productive minutes -- live for active
    /// sessions, frozen for terminal ones.
    pub total_productive_time: f64,
}

/// The full history payload: sessions in reverse-creation order plus the
/// aggregate counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryReport {
    pub sessions: Vec<SessionView>,
    #[serde(flatten)]
    pub summary: HistorySummary,
}

/// Fold a set of snapshots into the aggregate counters.
pub fn summarize(sessions: &[SessionView]) -> HistorySummary {
    let mut summary = HistorySummary::default();
    for session in sessions {
        summary.total_sessions += 1;
        match session.status {
            SessionStatus::Completed => summary.completed_sessions += 1,
            SessionStatus::Interrupted => summary.interrupted_sessions += 1,
            SessionStatus::Overdue => summary.overdue_sessions += 1,
            SessionStatus::Abandoned => summary.abandoned_sessions += 1,
            _ => {}
        }
        summary.total_interruptions += session.interruptions.len() as u64;
        summary.total_productive_time += session.productive_minutes;
    }
    summary
}
