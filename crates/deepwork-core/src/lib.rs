//! # Deepwork Core Library
//!
//! Authoritative lifecycle engine for timed deep-work sessions. The engine
//! owns wall-clock timing, enforces which state transitions are legal,
//! reconciles pause/resume cycles into productive-time accounting, and
//! autonomously promotes idle or over-budget sessions into terminal states.
//! Any presentation layer (CLI, HTTP, GUI) is expected to be a thin shim
//! over the operations exposed here.
//!
//! ## Architecture
//!
//! - **Machine**: validates and applies transitions; the only mutation path
//!   for a session record
//! - **Accounting**: pure "evaluate as of now" time arithmetic over the
//!   activity-interval log -- no ticking timer exists anywhere
//! - **Sweeper**: periodic background task promoting sessions to `overdue`,
//!   `interrupted`, or `abandoned` when no client acts in time
//! - **Storage**: write-through `SessionStore` (SQLite or in-memory) plus
//!   TOML-based configuration
//!
//! ## Key Components
//!
//! - [`Engine`]: the facade external collaborators call
//! - [`Session`] / [`SessionView`]: the session record and its exposed shape
//! - [`Sweeper`]: background auto-transition loop
//! - [`EngineConfig`]: tunable thresholds (duration bounds, abandonment
//!   timeout, grace multiplier, sweep period)

pub mod accounting;
pub mod clock;
pub mod engine;
pub mod error;
mod machine;
pub mod session;
pub mod stats;
pub mod storage;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Engine;
pub use error::{ConfigError, EngineError, StoreError};
pub use machine::{AutoTransition, TransitionEvent};
pub use session::{ActivityInterval, Interruption, Session, SessionStatus, SessionView};
pub use stats::{HistoryReport, HistorySummary};
pub use storage::{EngineConfig, MemoryStore, SessionStore, SqliteStore};
pub use sweeper::{SweepReport, Sweeper, SweeperHandle};
