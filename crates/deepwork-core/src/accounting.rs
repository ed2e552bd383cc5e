//! Time accounting.
//!
//! Pure functions over a session's activity-interval log and a frozen "now".
//! Both the sweep evaluation and the read path (`get`, `history`) go through
//! here, so elapsed and productive time can be answered without mutating
//! anything -- no live ticking timer exists anywhere in the engine.

use chrono::{DateTime, Utc};

use crate::session::{ActivityInterval, Session};

/// Derived time figures for one session at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeReport {
    /// Minutes between `start_time` and now (or `end_time` for terminal
    /// sessions). `None` if the session never started.
    pub elapsed_minutes: Option<f64>,
    /// Sum of closed interval durations plus the open interval's running
    /// duration, in minutes.
    pub productive_minutes: f64,
    /// Whether productive time has reached the scheduled duration.
    pub over_budget: bool,
}

/// Compute the time figures for `session` as of `now`.
///
/// Referentially transparent: identical inputs give identical results no
/// matter how often it is called.
pub fn report(session: &Session, now: DateTime<Utc>) -> TimeReport {
    let productive = productive_minutes(session.activity_intervals(), now);
    let elapsed_until = match session.end_time() {
        Some(end) => Some(end),
        None => session.start_time().map(|_| now),
    };
    let elapsed_minutes = session
        .start_time()
        .zip(elapsed_until)
        .map(|(start, until)| minutes_between(start, until));
    TimeReport {
        elapsed_minutes,
        productive_minutes: productive,
        over_budget: productive >= session.scheduled_duration() as f64,
    }
}

/// Sum the interval log in minutes, counting an open interval up to `now`.
pub fn productive_minutes(intervals: &[ActivityInterval], now: DateTime<Utc>) -> f64 {
    intervals
        .iter()
        .map(|interval| minutes_between(interval.started_at, interval.ended_at.unwrap_or(now)))
        .sum()
}

fn minutes_between(from: DateTime<Utc>, until: DateTime<Utc>) -> f64 {
    let ms = (until - from).num_milliseconds().max(0);
    ms as f64 / 60_000.0
}
