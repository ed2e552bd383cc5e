//! Shared setup for CLI commands.

use std::sync::Arc;

use deepwork_core::{Engine, EngineConfig, SqliteStore, SystemClock};

/// Open the engine over the on-disk store and configuration.
pub fn open_engine() -> Result<Engine, Box<dyn std::error::Error>> {
    let config = EngineConfig::load()?;
    let store = Arc::new(SqliteStore::open()?);
    let engine = Engine::new(config, store, Arc::new(SystemClock))?;
    Ok(engine)
}
