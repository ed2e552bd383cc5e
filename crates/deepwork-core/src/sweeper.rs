//! Background sweeper.
//!
//! Wakes on a fixed period, enumerates non-terminal sessions and applies
//! time-based auto-transitions (overdue, interrupted, abandoned) through the
//! engine's normal per-session lock. A failure on one session is logged and
//! the sweep moves on; shutdown is honored between sessions, never in the
//! middle of a transition.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::engine::Engine;
use crate::session::SessionStatus;

/// Outcome of one sweep pass.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Sessions auto-transitioned this pass, with their new status.
    pub transitions: Vec<(Uuid, SessionStatus)>,
    /// Sessions whose evaluation failed (logged, not fatal).
    pub failures: usize,
}

/// Run a single sweep pass over every non-terminal session.
///
/// Exposed for deterministic tests and for one-shot callers; the background
/// task runs the same pass on its schedule.
pub async fn sweep_once(engine: &Engine) -> SweepReport {
    sweep(engine, None).await
}

async fn sweep(engine: &Engine, cancel: Option<&watch::Receiver<bool>>) -> SweepReport {
    let mut report = SweepReport::default();
    for id in engine.non_terminal_ids().await {
        if cancel.is_some_and(|rx| *rx.borrow()) {
            break;
        }
        match engine.sweep_session(id).await {
            Ok(Some(status)) => {
                tracing::info!(%id, %status, "auto-transitioned session");
                report.transitions.push((id, status));
            }
            Ok(None) => {}
            Err(e) => {
                // One bad session must not starve the rest of the sweep.
                tracing::warn!(%id, error = %e, "sweep failed for session");
                report.failures += 1;
            }
        }
    }
    report
}

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to exit.
    ///
    /// Takes effect at the next between-sessions checkpoint; an in-flight
    /// transition always runs to completion first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// The periodic auto-transition task.
pub struct Sweeper;

impl Sweeper {
    /// Spawn the background sweep loop on the engine's configured period.
    pub fn spawn(engine: Arc<Engine>) -> SweeperHandle {
        let period = engine.config().sweep_interval();
        let (tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = ticker.tick() => {
                        sweep(&engine, Some(&rx)).await;
                        if *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("sweeper stopped");
        });
        SweeperHandle { shutdown: tx, task }
    }
}
