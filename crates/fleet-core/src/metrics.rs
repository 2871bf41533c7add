//! Folds durations and trip financials into period statistics.

use serde::Serialize;

use crate::interval::{DurationEstimate, EstimateSource};
use crate::trip::{PaymentMethod, TripRecord};
use crate::types::DriverId;

/// Statistics for one driver over one period.
///
/// `total_online_hours` always equals `active_hours + waiting_hours`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverPeriodStats {
    pub driver_id: DriverId,
    pub period_label: String,
    pub orders_completed: usize,
    pub gross_earnings: f64,
    pub net_earnings: f64,
    /// Net earnings of cash-paid trips.
    pub cash_collected: f64,
    pub distance_km: f64,
    pub active_hours: f64,
    pub waiting_hours: f64,
    pub total_online_hours: f64,
    pub earnings_per_active_hour: f64,
    pub earnings_per_online_hour: f64,
    pub earnings_per_km: f64,
    pub avg_distance_per_trip: f64,
    /// Which estimate the hour figures came from.
    pub duration_source: EstimateSource,
}

/// Result of aggregating one driver's period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatsOutcome {
    Stats(DriverPeriodStats),
    /// No finished trips in the window.
    NoData,
}

impl StatsOutcome {
    /// The stats, if any.
    pub const fn stats(&self) -> Option<&DriverPeriodStats> {
        match self {
            Self::Stats(stats) => Some(stats),
            Self::NoData => None,
        }
    }
}

/// Divides, yielding zero for a zero (or negative) denominator.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Builds a driver's statistics from the chosen estimate and their trips.
///
/// Only finished trips of `driver_id` count. Returns
/// [`StatsOutcome::NoData`] when none remain.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(
    driver_id: &DriverId,
    estimate: &DurationEstimate,
    trips: &[TripRecord],
    period_label: &str,
) -> StatsOutcome {
    let finished: Vec<&TripRecord> = trips
        .iter()
        .filter(|trip| &trip.driver_id == driver_id && trip.is_finished())
        .collect();

    if finished.is_empty() {
        return StatsOutcome::NoData;
    }

    let orders_completed = finished.len();
    let gross_earnings: f64 = finished.iter().map(|t| t.gross_price).sum();
    let net_earnings: f64 = finished.iter().map(|t| t.net_earnings).sum();
    let cash_collected: f64 = finished
        .iter()
        .filter(|t| t.payment_method == PaymentMethod::Cash)
        .map(|t| t.net_earnings)
        .sum();
    let distance_km: f64 = finished.iter().map(|t| t.distance_km()).sum();

    let active_hours = estimate.active_hours;
    let waiting_hours = estimate.waiting_hours;
    let total_online_hours = estimate.total_online_hours();

    StatsOutcome::Stats(DriverPeriodStats {
        driver_id: driver_id.clone(),
        period_label: period_label.to_string(),
        orders_completed,
        gross_earnings,
        net_earnings,
        cash_collected,
        distance_km,
        active_hours,
        waiting_hours,
        total_online_hours,
        earnings_per_active_hour: ratio(gross_earnings, active_hours),
        earnings_per_online_hour: ratio(gross_earnings, total_online_hours),
        earnings_per_km: ratio(gross_earnings, distance_km),
        avg_distance_per_trip: ratio(distance_km, orders_completed as f64),
        duration_source: estimate.source,
    })
}

/// Fleet-wide totals across drivers with data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetTotals {
    pub active_drivers: usize,
    pub trips_completed: usize,
    pub gross_earnings: f64,
    pub net_earnings: f64,
    pub cash_collected: f64,
    pub distance_km: f64,
    pub active_hours: f64,
    pub waiting_hours: f64,
    pub total_online_hours: f64,
    pub earnings_per_trip: f64,
    pub earnings_per_km: f64,
    pub earnings_per_online_hour: f64,
}

/// Per-driver stats plus fleet totals for one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetStats {
    pub period_label: String,
    /// Sorted by gross earnings, highest first.
    pub drivers: Vec<DriverPeriodStats>,
    pub totals: FleetTotals,
}

/// Result of aggregating the whole fleet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FleetOutcome {
    Stats(FleetStats),
    /// No driver had a finished trip in the window.
    NoData,
}

/// Combines per-driver outcomes into fleet statistics.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_fleet(per_driver: Vec<StatsOutcome>, period_label: &str) -> FleetOutcome {
    let mut drivers: Vec<DriverPeriodStats> = per_driver
        .into_iter()
        .filter_map(|outcome| match outcome {
            StatsOutcome::Stats(stats) => Some(stats),
            StatsOutcome::NoData => None,
        })
        .collect();

    if drivers.is_empty() {
        return FleetOutcome::NoData;
    }

    drivers.sort_by(|a, b| {
        b.gross_earnings
            .total_cmp(&a.gross_earnings)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    let sum = |f: fn(&DriverPeriodStats) -> f64| drivers.iter().map(f).sum::<f64>();
    let trips_completed: usize = drivers.iter().map(|d| d.orders_completed).sum();
    let gross_earnings = sum(|d| d.gross_earnings);
    let distance_km = sum(|d| d.distance_km);
    let active_hours = sum(|d| d.active_hours);
    let waiting_hours = sum(|d| d.waiting_hours);
    let total_online_hours = active_hours + waiting_hours;

    let totals = FleetTotals {
        active_drivers: drivers.len(),
        trips_completed,
        gross_earnings,
        net_earnings: sum(|d| d.net_earnings),
        cash_collected: sum(|d| d.cash_collected),
        distance_km,
        active_hours,
        waiting_hours,
        total_online_hours,
        earnings_per_trip: ratio(gross_earnings, trips_completed as f64),
        earnings_per_km: ratio(gross_earnings, distance_km),
        earnings_per_online_hour: ratio(gross_earnings, total_online_hours),
    };

    FleetOutcome::Stats(FleetStats {
        period_label: period_label.to_string(),
        drivers,
        totals,
    })
}
