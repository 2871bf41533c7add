//! Query facade over trip and state-log sources.
//!
//! The engine resolves a period into a window, asks its collaborators for
//! the relevant records, reconstructs intervals, picks a duration
//! estimate, and aggregates. It holds no state between calls, so the same
//! inputs always give the same answer.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::fallback::{FallbackConfig, estimate_from_trips};
use crate::interval::{DurationEstimate, Interval};
use crate::metrics::{FleetOutcome, StatsOutcome, aggregate, aggregate_fleet};
use crate::reconcile::{ReconcileConfig, Reconciled, select_estimate};
use crate::reconstruct::DriverTimeline;
use crate::state::{StateEvent, StateVocabulary};
use crate::trip::TripRecord;
use crate::types::DriverId;
use crate::window::{Period, TimeWindow, WindowConfig, resolve_window};

/// Supplies trip records.
pub trait TripSource {
    /// Finished trips for `driver_id` whose finish time falls in `window`.
    fn trips_for(&self, driver_id: &DriverId, window: &TimeWindow) -> Vec<TripRecord>;

    /// Every driver known to the source, in ascending id order.
    fn drivers(&self) -> Vec<DriverId>;
}

/// Supplies raw state-change events.
pub trait StateLogSource {
    /// Events for `driver_id` before `window.end`.
    ///
    /// Must include the events preceding `window.start` that establish
    /// the driver's state at the window start.
    fn state_events_for(&self, driver_id: &DriverId, window: &TimeWindow) -> Vec<StateEvent>;
}

/// An in-memory copy of both sources.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub trips: Vec<TripRecord>,
    pub state_events: Vec<StateEvent>,
    driver_names: BTreeMap<DriverId, String>,
}

impl Snapshot {
    pub fn new(trips: Vec<TripRecord>, state_events: Vec<StateEvent>) -> Self {
        Self {
            trips,
            state_events,
            driver_names: BTreeMap::new(),
        }
    }

    /// Records a display name for a driver. The first name seen wins.
    pub fn remember_name(&mut self, driver_id: &DriverId, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        self.driver_names
            .entry(driver_id.clone())
            .or_insert_with(|| name.to_string());
    }

    pub fn driver_name(&self, driver_id: &DriverId) -> Option<&str> {
        self.driver_names.get(driver_id).map(String::as_str)
    }
}

impl TripSource for Snapshot {
    fn trips_for(&self, driver_id: &DriverId, window: &TimeWindow) -> Vec<TripRecord> {
        self.trips
            .iter()
            .filter(|trip| {
                &trip.driver_id == driver_id
                    && trip.is_finished()
                    && window.contains(trip.finished_at)
            })
            .cloned()
            .collect()
    }

    fn drivers(&self) -> Vec<DriverId> {
        let ids: BTreeSet<&DriverId> = self
            .trips
            .iter()
            .map(|trip| &trip.driver_id)
            .chain(self.state_events.iter().map(|event| &event.driver_id))
            .collect();
        ids.into_iter().cloned().collect()
    }
}

impl StateLogSource for Snapshot {
    fn state_events_for(&self, driver_id: &DriverId, window: &TimeWindow) -> Vec<StateEvent> {
        self.state_events
            .iter()
            .filter(|event| &event.driver_id == driver_id && event.timestamp < window.end)
            .cloned()
            .collect()
    }
}

/// All engine tunables.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    pub fallback: FallbackConfig,
    pub reconcile: ReconcileConfig,
    pub vocabulary: StateVocabulary,
}

/// Both estimates for one driver and window, with the one that won.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverBreakdown {
    pub driver_id: DriverId,
    pub window: TimeWindow,
    pub intervals: Vec<Interval>,
    pub state_estimate: DurationEstimate,
    pub order_estimate: DurationEstimate,
    pub selected: Reconciled,
}

/// Answers stats queries against a source.
#[derive(Debug, Clone, Copy)]
pub struct Engine<'a, S> {
    source: &'a S,
    config: &'a EngineConfig,
}

impl<'a, S> Engine<'a, S>
where
    S: TripSource + StateLogSource,
{
    pub const fn new(source: &'a S, config: &'a EngineConfig) -> Self {
        Self { source, config }
    }

    /// Resolves `period` into a UTC window.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is empty after clamping.
    pub fn resolve(&self, period: &Period, now: DateTime<Utc>) -> Result<TimeWindow, EngineError> {
        resolve_window(period, now, &self.config.window)
    }

    /// Statistics for one driver over `period`.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not resolve to a valid window.
    pub fn driver_stats(
        &self,
        driver_id: &DriverId,
        period: &Period,
        now: DateTime<Utc>,
    ) -> Result<StatsOutcome, EngineError> {
        let window = self.resolve(period, now)?;
        Ok(self.stats_in_window(driver_id, &window))
    }

    /// The reconstructed state-log intervals for one driver over `period`.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not resolve to a valid window.
    pub fn driver_intervals(
        &self,
        driver_id: &DriverId,
        period: &Period,
        now: DateTime<Utc>,
    ) -> Result<Vec<Interval>, EngineError> {
        let window = self.resolve(period, now)?;
        let events = self.source.state_events_for(driver_id, &window);
        let timeline = DriverTimeline::new(driver_id, &window, &events, &self.config.vocabulary);
        Ok(timeline.intervals())
    }

    /// Both duration estimates for one driver and which one is trusted.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not resolve to a valid window.
    pub fn driver_breakdown(
        &self,
        driver_id: &DriverId,
        period: &Period,
        now: DateTime<Utc>,
    ) -> Result<DriverBreakdown, EngineError> {
        let window = self.resolve(period, now)?;
        let (breakdown, _) = self.breakdown_in_window(driver_id, &window);
        Ok(breakdown)
    }

    fn stats_in_window(&self, driver_id: &DriverId, window: &TimeWindow) -> StatsOutcome {
        let (breakdown, trips) = self.breakdown_in_window(driver_id, window);
        aggregate(
            driver_id,
            &breakdown.selected.estimate,
            &trips,
            &window.label,
        )
    }

    fn breakdown_in_window(
        &self,
        driver_id: &DriverId,
        window: &TimeWindow,
    ) -> (DriverBreakdown, Vec<TripRecord>) {
        let trips = self.source.trips_for(driver_id, window);
        let events = self.source.state_events_for(driver_id, window);

        let timeline = DriverTimeline::new(driver_id, window, &events, &self.config.vocabulary);
        let intervals = timeline.intervals();
        let state_estimate = DurationEstimate::from_intervals(&intervals);
        let order_estimate = estimate_from_trips(driver_id, &trips, &self.config.fallback);
        let selected = select_estimate(
            &timeline,
            state_estimate,
            order_estimate,
            &self.config.reconcile,
            &self.config.window.timezone,
        );

        tracing::debug!(
            driver = %driver_id,
            window = %window.label,
            trips = trips.len(),
            events = events.len(),
            source = %selected.estimate.source,
            "computed driver breakdown"
        );

        let breakdown = DriverBreakdown {
            driver_id: driver_id.clone(),
            window: window.clone(),
            intervals,
            state_estimate,
            order_estimate,
            selected,
        };
        (breakdown, trips)
    }
}

impl<S> Engine<'_, S>
where
    S: TripSource + StateLogSource + Sync,
{
    /// Statistics for every driver over `period`, plus fleet totals.
    ///
    /// Drivers are computed in parallel; each computation is independent.
    ///
    /// # Errors
    ///
    /// Returns an error if the period does not resolve to a valid window.
    pub fn fleet_stats(
        &self,
        period: &Period,
        now: DateTime<Utc>,
    ) -> Result<FleetOutcome, EngineError> {
        let window = self.resolve(period, now)?;
        let drivers = self.source.drivers();
        tracing::debug!(drivers = drivers.len(), window = %window.label, "computing fleet stats");

        let per_driver: Vec<StatsOutcome> = drivers
            .par_iter()
            .map(|driver_id| self.stats_in_window(driver_id, &window))
            .collect();

        Ok(aggregate_fleet(per_driver, &window.label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::{EstimateSource, IntervalKind};
    use crate::reconcile::SelectionReason;
    use crate::trip::{PaymentMethod, TripStatus};
    use crate::types::TripId;
    use chrono::{NaiveDate, TimeZone};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 27, hour, minute, 0).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 28, 12, 0, 0).unwrap()
    }

    fn day() -> Period {
        Period::Day(NaiveDate::from_ymd_opt(2025, 8, 27).unwrap())
    }

    fn id(raw: &str) -> DriverId {
        DriverId::new(raw).unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn trip(
        trip_id: &str,
        driver: &str,
        accepted: DateTime<Utc>,
        finished: DateTime<Utc>,
        meters: u32,
        gross: f64,
        net: f64,
        payment_method: PaymentMethod,
    ) -> TripRecord {
        TripRecord {
            trip_id: TripId::new(trip_id).unwrap(),
            driver_id: id(driver),
            accepted_at: Some(accepted),
            finished_at: finished,
            distance_meters: Some(meters),
            gross_price: gross,
            net_earnings: net,
            commission: gross - net,
            payment_method,
            status: TripStatus::Finished,
        }
    }

    fn event(driver: &str, ts: DateTime<Utc>, raw: &str) -> StateEvent {
        StateEvent::new(id(driver), ts, raw)
    }

    /// Driver a has a full state log, b only trips, c only state events.
    fn snapshot() -> Snapshot {
        let trips = vec![
            trip("o-1", "a", at(9, 20), at(9, 50), 10_000, 20.0, 16.0, PaymentMethod::Card),
            trip("o-2", "b", at(12, 0), at(12, 25), 8_000, 12.0, 9.6, PaymentMethod::Cash),
            trip("o-3", "b", at(12, 45), at(13, 5), 6_000, 10.0, 8.0, PaymentMethod::Card),
        ];
        let events = vec![
            event("a", at(9, 0), "waiting_orders"),
            event("a", at(9, 20), "has_order"),
            event("a", at(9, 50), "waiting_orders"),
            event("a", at(10, 30), "inactive"),
            event("c", at(8, 0), "waiting_orders"),
            event("c", at(9, 0), "inactive"),
        ];
        let mut snapshot = Snapshot::new(trips, events);
        snapshot.remember_name(&id("a"), "Alice Tamm");
        snapshot
    }

    fn assert_hours(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected} hours, got {actual}"
        );
    }

    #[test]
    fn test_state_log_driver_uses_intervals() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let outcome = engine.driver_stats(&id("a"), &day(), now()).unwrap();
        let stats = outcome.stats().unwrap();

        assert_eq!(stats.duration_source, EstimateSource::StateLog);
        assert_eq!(stats.orders_completed, 1);
        assert_eq!(stats.period_label, "Aug 27, 2025");
        assert_hours(stats.active_hours, 0.5);
        assert_hours(stats.waiting_hours, 1.0);
        assert_hours(stats.earnings_per_active_hour, 40.0);
        assert_hours(stats.earnings_per_km, 2.0);
    }

    #[test]
    fn test_driver_without_state_log_falls_back_to_orders() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let outcome = engine.driver_stats(&id("b"), &day(), now()).unwrap();
        let stats = outcome.stats().unwrap();

        assert_eq!(stats.duration_source, EstimateSource::OrderDerived);
        assert_hours(stats.active_hours, 45.0 / 60.0);
        assert_hours(stats.waiting_hours, 20.0 / 60.0);
        assert_hours(stats.cash_collected, 9.6);
    }

    #[test]
    fn test_online_total_is_active_plus_waiting() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        for driver in ["a", "b"] {
            let outcome = engine.driver_stats(&id(driver), &day(), now()).unwrap();
            let stats = outcome.stats().unwrap();
            assert_hours(
                stats.total_online_hours,
                stats.active_hours + stats.waiting_hours,
            );
        }
    }

    #[test]
    fn test_repeated_queries_agree() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let first = engine.driver_stats(&id("a"), &day(), now()).unwrap();
        let second = engine.driver_stats(&id("a"), &day(), now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_state_events_without_trips_is_no_data() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let outcome = engine.driver_stats(&id("c"), &day(), now()).unwrap();
        assert_eq!(outcome, StatsOutcome::NoData);
    }

    #[test]
    fn test_empty_day_is_no_data() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);
        let quiet_day = Period::Day(NaiveDate::from_ymd_opt(2025, 8, 20).unwrap());

        let outcome = engine.driver_stats(&id("a"), &quiet_day, now()).unwrap();
        assert_eq!(outcome, StatsOutcome::NoData);
    }

    #[test]
    fn test_empty_period_is_invalid_window() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let result = engine.driver_stats(&id("a"), &Period::LastNDays(0), now());
        assert!(matches!(result, Err(EngineError::InvalidWindow { .. })));
    }

    #[test]
    fn test_intervals_follow_the_state_log() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let intervals = engine.driver_intervals(&id("a"), &day(), now()).unwrap();
        let kinds: Vec<IntervalKind> = intervals.iter().map(|i| i.kind).collect();

        assert_eq!(
            kinds,
            vec![IntervalKind::Waiting, IntervalKind::Engaged, IntervalKind::Waiting]
        );
        assert_eq!(intervals[0].start, at(9, 0));
        assert_eq!(intervals[2].end, at(10, 30));
    }

    #[test]
    fn test_breakdown_reports_both_estimates() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let breakdown = engine.driver_breakdown(&id("a"), &day(), now()).unwrap();

        assert_eq!(breakdown.selected.reason, SelectionReason::StateLog);
        assert_eq!(breakdown.state_estimate.source, EstimateSource::StateLog);
        assert_eq!(breakdown.order_estimate.source, EstimateSource::OrderDerived);
        assert_hours(breakdown.order_estimate.active_hours, 0.5);
        assert_eq!(breakdown.intervals.len(), 3);
    }

    #[test]
    fn test_fleet_stats_sorts_and_totals() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);

        let FleetOutcome::Stats(fleet) = engine.fleet_stats(&day(), now()).unwrap() else {
            panic!("expected fleet stats");
        };

        let order: Vec<&str> = fleet.drivers.iter().map(|d| d.driver_id.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        assert_eq!(fleet.totals.active_drivers, 2);
        assert_eq!(fleet.totals.trips_completed, 3);
        assert_hours(fleet.totals.gross_earnings, 42.0);
    }

    #[test]
    fn test_fleet_without_trips_is_no_data() {
        let source = snapshot();
        let config = EngineConfig::default();
        let engine = Engine::new(&source, &config);
        let quiet_day = Period::Day(NaiveDate::from_ymd_opt(2025, 8, 20).unwrap());

        assert_eq!(
            engine.fleet_stats(&quiet_day, now()).unwrap(),
            FleetOutcome::NoData
        );
    }

    #[test]
    fn test_snapshot_lists_drivers_and_names() {
        let source = snapshot();

        let drivers: Vec<String> = source.drivers().iter().map(ToString::to_string).collect();
        assert_eq!(drivers, vec!["a", "b", "c"]);
        assert_eq!(source.driver_name(&id("a")), Some("Alice Tamm"));
        assert_eq!(source.driver_name(&id("b")), None);
    }

    #[test]
    fn test_snapshot_trips_are_limited_to_window() {
        let source = snapshot();
        let window = TimeWindow::new(at(12, 0), at(13, 0), "noon").unwrap();

        let trips = source.trips_for(&id("b"), &window);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].trip_id.as_str(), "o-2");
    }

    #[test]
    fn test_config_round_trips_through_serde_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
