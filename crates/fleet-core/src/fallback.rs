//! Order-derived duration estimate.
//!
//! Used when state logs are missing, too old, or too thin. Active time is
//! the accept-to-finish span of each trip, clamped to what the trip's
//! distance makes plausible. Waiting time is the gap between one trip's
//! finish and the next trip's accept, credited in full for short gaps,
//! capped for medium gaps, and dropped for long ones (a break).

use serde::{Deserialize, Serialize};

use crate::interval::{DurationEstimate, EstimateSource};
use crate::trip::TripRecord;
use crate::types::DriverId;

/// Thresholds for the order-derived estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Slowest plausible average speed. Sets the per-trip upper bound.
    /// Default: 10 km/h.
    pub min_speed_kmh: f64,

    /// Fastest plausible average speed. Sets the per-trip lower bound.
    /// Default: 60 km/h.
    pub max_speed_kmh: f64,

    /// Per-trip cap when distance is unknown. Default: 7200 (2 hours).
    pub flat_cap_secs: i64,

    /// Gaps up to this long count in full as waiting. Default: 1800 (30 minutes).
    pub full_gap_secs: i64,

    /// Gaps longer than this are breaks and count as nothing.
    /// Default: 3600 (1 hour).
    pub break_gap_secs: i64,

    /// Waiting credited for gaps between `full_gap_secs` and `break_gap_secs`.
    /// Default: 1800 (30 minutes).
    pub capped_gap_credit_secs: i64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            min_speed_kmh: 10.0,
            max_speed_kmh: 60.0,
            flat_cap_secs: 7_200,         // 2 hours
            full_gap_secs: 1_800,         // 30 minutes
            break_gap_secs: 3_600,        // 1 hour
            capped_gap_credit_secs: 1_800, // 30 minutes
        }
    }
}

impl FallbackConfig {
    /// Clamps a trip's raw duration into its plausibility range.
    #[allow(clippy::cast_precision_loss)]
    fn clamp_active_secs(&self, raw_secs: i64, distance_meters: Option<u32>) -> f64 {
        match distance_meters.filter(|m| *m > 0) {
            Some(meters) => {
                let km = f64::from(meters) / 1000.0;
                let lower = km / self.max_speed_kmh * 3600.0;
                let upper = km / self.min_speed_kmh * 3600.0;
                // max/min rather than clamp: a misconfigured lower > upper must not panic.
                (raw_secs as f64).max(lower).min(upper)
            }
            None => raw_secs.min(self.flat_cap_secs) as f64,
        }
    }

    /// Waiting seconds credited for the gap between two trips.
    const fn gap_credit_secs(&self, gap_secs: i64) -> i64 {
        if gap_secs <= 0 {
            0
        } else if gap_secs <= self.full_gap_secs {
            gap_secs
        } else if gap_secs <= self.break_gap_secs {
            self.capped_gap_credit_secs
        } else {
            0
        }
    }
}

/// Estimates active and waiting hours for `driver_id` from trip timestamps.
///
/// `trips` should already be limited to the window; trips from other
/// drivers or with a non-finished status are ignored. Trips missing
/// `accepted_at` (or finishing before they were accepted) are left out
/// of both sums. Results are rounded to whole minutes.
#[allow(clippy::cast_precision_loss)]
pub fn estimate_from_trips(
    driver_id: &DriverId,
    trips: &[TripRecord],
    config: &FallbackConfig,
) -> DurationEstimate {
    let mut timed: Vec<&TripRecord> = trips
        .iter()
        .filter(|trip| &trip.driver_id == driver_id && trip.is_finished())
        .filter(|trip| {
            let usable = trip.raw_duration_secs().is_some();
            if !usable {
                tracing::debug!(
                    driver = %driver_id,
                    trip = %trip.trip_id,
                    "trip lacks usable accept/finish timestamps; excluded from duration"
                );
            }
            usable
        })
        .collect();
    timed.sort_by_key(|trip| trip.accepted_at);

    let active_secs: f64 = timed
        .iter()
        .filter_map(|trip| {
            trip.raw_duration_secs()
                .map(|raw| config.clamp_active_secs(raw, trip.distance_meters))
        })
        .sum();

    let waiting_secs: i64 = timed
        .windows(2)
        .filter_map(|pair| match pair {
            [prev, next] => next
                .accepted_at
                .map(|accepted| (accepted - prev.finished_at).num_seconds()),
            _ => None,
        })
        .map(|gap| config.gap_credit_secs(gap))
        .sum();

    DurationEstimate {
        active_hours: round_to_minutes_hours(active_secs),
        waiting_hours: round_to_minutes_hours(waiting_secs as f64),
        source: EstimateSource::OrderDerived,
    }
}

/// Rounds seconds to the nearest whole minute and returns hours.
fn round_to_minutes_hours(secs: f64) -> f64 {
    (secs / 60.0).round() / 60.0
}
