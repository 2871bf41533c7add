//! CLI subcommand implementations.

pub mod drivers;
pub mod fleet;
pub mod intervals;
pub mod stats;
pub mod util;

use chrono::{DateTime, Utc};
use fleet_core::{Engine, EngineConfig, Snapshot};

/// Everything a query command needs: the loaded records, the engine
/// settings, and the instant treated as "now".
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub snapshot: Snapshot,
    pub config: EngineConfig,
    pub now: DateTime<Utc>,
}

impl QueryContext {
    pub const fn engine(&self) -> Engine<'_, Snapshot> {
        Engine::new(&self.snapshot, &self.config)
    }
}
