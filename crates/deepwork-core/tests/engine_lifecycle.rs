//! Integration tests for the engine's client-facing operation set:
//! create/get/transition/history, locking behavior under contention, and
//! the bounded store retry policy.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use deepwork_core::{
    Clock, Engine, EngineConfig, EngineError, ManualClock, MemoryStore, Session, SessionStatus,
    SessionStore, StoreError, TransitionEvent,
};

fn test_engine() -> (Arc<Engine>, Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(EngineConfig::default(), store.clone(), clock.clone()).unwrap();
    (Arc::new(engine), clock, store)
}

fn pause(reason: &str) -> TransitionEvent {
    TransitionEvent::Pause {
        reason: reason.into(),
    }
}

fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

#[tokio::test]
async fn scenario_full_lifecycle_with_one_pause() {
    let (engine, clock, _) = test_engine();

    let created = engine
        .create("Write docs", "Draft section 1", 25)
        .await
        .unwrap();
    assert_eq!(created.status, SessionStatus::Planned);
    assert!(created.start_time.is_none());

    let started = engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap();
    assert_eq!(started.status, SessionStatus::Active);
    assert_eq!(started.start_time, Some(clock.now()));

    clock.advance(minutes(10));
    let paused = engine.transition(created.id, pause("call")).await.unwrap();
    assert_eq!(paused.status, SessionStatus::Paused);
    assert_eq!(paused.interruptions.len(), 1);
    assert_eq!(paused.interruptions[0].reason, "call");
    assert!((paused.productive_minutes - 10.0).abs() < 1e-9);

    // Productive time is frozen while paused.
    clock.advance(minutes(5));
    let idle = engine.get(created.id).await.unwrap();
    assert!((idle.productive_minutes - 10.0).abs() < 1e-9);

    let resumed = engine
        .transition(created.id, TransitionEvent::Resume)
        .await
        .unwrap();
    assert_eq!(resumed.status, SessionStatus::Active);

    clock.advance(minutes(15));
    let completed = engine
        .transition(created.id, TransitionEvent::Complete)
        .await
        .unwrap();
    assert_eq!(completed.status, SessionStatus::Completed);
    assert_eq!(completed.end_time, Some(clock.now()));
    assert!((completed.productive_minutes - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn create_enforces_duration_bounds() {
    let (engine, _, _) = test_engine();

    for bad in [0, 241, 1000] {
        let err = engine.create("t", "g", bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidDuration { .. }), "{bad}");
    }
    assert!(engine.create("t", "g", 1).await.is_ok());
    assert!(engine.create("t", "g", 240).await.is_ok());
}

#[tokio::test]
async fn second_start_is_rejected_and_start_time_unchanged() {
    let (engine, clock, _) = test_engine();
    let created = engine.create("t", "g", 25).await.unwrap();

    let first = engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap();
    let start_time = first.start_time;

    clock.advance(minutes(3));
    let err = engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition {
            from: SessionStatus::Active,
            event: "start"
        }
    ));
    assert_eq!(engine.get(created.id).await.unwrap().start_time, start_time);
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let (engine, _, _) = test_engine();
    let id = uuid::Uuid::new_v4();
    assert!(matches!(
        engine.get(id).await.unwrap_err(),
        EngineError::NotFound(got) if got == id
    ));
    assert!(matches!(
        engine.transition(id, TransitionEvent::Start).await.unwrap_err(),
        EngineError::NotFound(_)
    ));
}

#[tokio::test]
async fn pause_with_blank_reason_is_rejected() {
    let (engine, _, _) = test_engine();
    let created = engine.create("t", "g", 25).await.unwrap();
    engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap();

    let err = engine.transition(created.id, pause("  ")).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition { .. }));

    let view = engine.get(created.id).await.unwrap();
    assert_eq!(view.status, SessionStatus::Active);
    assert!(view.interruptions.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_pause_requests_have_one_winner() {
    let (engine, _, _) = test_engine();
    let created = engine.create("t", "g", 25).await.unwrap();
    engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap();

    let a = {
        let engine = engine.clone();
        let id = created.id;
        tokio::spawn(async move { engine.transition(id, pause("ping")).await })
    };
    let b = {
        let engine = engine.clone();
        let id = created.id;
        tokio::spawn(async move { engine.transition(id, pause("pong")).await })
    };
    let (a, b) = (a.await.unwrap(), b.await.unwrap());

    assert_eq!(
        a.is_ok() as u32 + b.is_ok() as u32,
        1,
        "exactly one pause must win"
    );
    let loser = if a.is_err() { a } else { b };
    assert!(matches!(
        loser.unwrap_err(),
        EngineError::InvalidTransition {
            from: SessionStatus::Paused,
            event: "pause"
        }
    ));

    let view = engine.get(created.id).await.unwrap();
    assert_eq!(view.status, SessionStatus::Paused);
    assert_eq!(view.interruptions.len(), 1);
}

#[tokio::test]
async fn history_is_reverse_creation_order_with_consistent_totals() {
    let (engine, clock, _) = test_engine();

    let first = engine.create("one", "g", 25).await.unwrap();
    clock.advance(minutes(1));
    let second = engine.create("two", "g", 30).await.unwrap();
    clock.advance(minutes(1));
    let third = engine.create("three", "g", 45).await.unwrap();

    engine
        .transition(second.id, TransitionEvent::Start)
        .await
        .unwrap();
    clock.advance(minutes(12));
    engine.transition(second.id, pause("tea")).await.unwrap();
    engine
        .transition(second.id, TransitionEvent::Complete)
        .await
        .unwrap();

    engine
        .transition(third.id, TransitionEvent::Start)
        .await
        .unwrap();
    clock.advance(minutes(4));

    let report = engine.history().await;
    let ids: Vec<_> = report.sessions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);

    let summary = &report.summary;
    assert_eq!(summary.total_sessions, 3);
    assert_eq!(summary.completed_sessions, 1);
    assert_eq!(summary.total_interruptions, 1);
    // 12 productive minutes frozen in the completed session, 4 live ones in
    // the active session.
    assert!((summary.total_productive_time - 16.0).abs() < 1e-9);

    let live = report
        .sessions
        .iter()
        .filter(|s| !s.status.is_terminal())
        .count() as u64;
    assert_eq!(
        summary.total_sessions,
        summary.completed_sessions
            + summary.interrupted_sessions
            + summary.overdue_sessions
            + summary.abandoned_sessions
            + live
    );
}

#[tokio::test]
async fn engine_reloads_persisted_sessions() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(MemoryStore::new());

    let engine = Engine::new(EngineConfig::default(), store.clone(), clock.clone()).unwrap();
    let created = engine.create("t", "g", 25).await.unwrap();
    engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap();
    drop(engine);

    let reloaded = Engine::new(EngineConfig::default(), store, clock).unwrap();
    let view = reloaded.get(created.id).await.unwrap();
    assert_eq!(view.status, SessionStatus::Active);
    assert_eq!(view.title, "t");
}

/// Store that fails the first `failures` saves, then delegates.
struct FlakyStore {
    inner: MemoryStore,
    remaining_failures: AtomicU32,
}

impl FlakyStore {
    fn new(failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            remaining_failures: AtomicU32::new(failures),
        }
    }
}

impl SessionStore for FlakyStore {
    fn save(&self, session: &Session) -> Result<(), StoreError> {
        if self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Unavailable("simulated outage".into()));
        }
        self.inner.save(session)
    }

    fn load_all(&self) -> Result<Vec<Session>, StoreError> {
        self.inner.load_all()
    }
}

#[tokio::test]
async fn transient_store_failures_are_retried_within_budget() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(FlakyStore::new(2));
    let config = EngineConfig {
        store_write_attempts: 3,
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, store.clone(), clock).unwrap();

    // Two failures, third attempt lands.
    let created = engine.create("t", "g", 25).await.unwrap();
    assert_eq!(store.inner.len(), 1);
    assert_eq!(created.status, SessionStatus::Planned);
}

#[tokio::test]
async fn exhausted_retry_budget_leaves_the_session_unchanged() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = Arc::new(FlakyStore::new(0));
    let config = EngineConfig {
        store_write_attempts: 2,
        ..EngineConfig::default()
    };
    let engine = Engine::new(config, store.clone(), clock).unwrap();
    let created = engine.create("t", "g", 25).await.unwrap();

    // Next two writes fail: the start transition exhausts its budget.
    store.remaining_failures.store(2, Ordering::SeqCst);
    let err = engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));

    // No partial application: still planned, never started.
    let view = engine.get(created.id).await.unwrap();
    assert_eq!(view.status, SessionStatus::Planned);
    assert!(view.start_time.is_none());

    // The same transition can be retried once the store recovers.
    let started = engine
        .transition(created.id, TransitionEvent::Start)
        .await
        .unwrap();
    assert_eq!(started.status, SessionStatus::Active);
}
