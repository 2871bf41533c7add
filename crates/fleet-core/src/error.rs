//! Engine error type.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced to callers of the engine.
///
/// "No finished trips" is not an error; it is reported through
/// [`crate::StatsOutcome::NoData`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The requested period resolves to an empty window after clamping
    /// to the operational epoch and the current time.
    #[error("invalid window: start {start} is not before end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}
