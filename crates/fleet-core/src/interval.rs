//! Online intervals and the duration estimates derived from them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::DriverId;

/// What the driver was doing during an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Waiting,
    Engaged,
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "waiting",
            Self::Engaged => "engaged",
        };
        write!(f, "{s}")
    }
}

/// Which data source produced a duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateSource {
    StateLog,
    OrderDerived,
}

impl fmt::Display for EstimateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StateLog => "state_log",
            Self::OrderDerived => "order_derived",
        };
        write!(f, "{s}")
    }
}

/// A span of online time for one driver.
///
/// For a fixed driver and source, intervals are sorted, never overlap,
/// and always have `end > start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub driver_id: DriverId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: IntervalKind,
    pub source: EstimateSource,
}

impl Interval {
    /// Length in whole seconds.
    pub fn duration_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

/// Active/waiting hours attributed to a driver over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub active_hours: f64,
    pub waiting_hours: f64,
    pub source: EstimateSource,
}

impl DurationEstimate {
    /// An estimate with no online time.
    pub const fn zero(source: EstimateSource) -> Self {
        Self {
            active_hours: 0.0,
            waiting_hours: 0.0,
            source,
        }
    }

    /// Sums engaged and waiting interval lengths.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_intervals(intervals: &[Interval]) -> Self {
        let (active, waiting) = intervals
            .iter()
            .fold((0_i64, 0_i64), |(active, waiting), interval| {
                match interval.kind {
                    IntervalKind::Engaged => (active + interval.duration_secs(), waiting),
                    IntervalKind::Waiting => (active, waiting + interval.duration_secs()),
                }
            });

        Self {
            active_hours: active as f64 / 3600.0,
            waiting_hours: waiting as f64 / 3600.0,
            source: EstimateSource::StateLog,
        }
    }

    /// Active plus waiting hours.
    pub fn total_online_hours(&self) -> f64 {
        self.active_hours + self.waiting_hours
    }
}
