//! State-log interval reconstruction.
//!
//! Folds a driver's state-change events into materialized
//! [`Interval`]s, one per contiguous stretch of waiting or engaged time.
//!
//! # Algorithm Summary
//!
//! 1. Keep the driver's events whose raw state the vocabulary knows, sorted by time
//! 2. Seed the state from the last event before the window (offline if none)
//! 3. Walk in-window events: going online opens an interval, switching
//!    between waiting and engaged splits it, going offline closes it
//! 4. Stop at the window end and close whatever is still open there

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::interval::{EstimateSource, Interval, IntervalKind};
use crate::state::{DriverState, StateEvent, StateVocabulary};
use crate::types::DriverId;
use crate::window::TimeWindow;

/// A driver's normalized state timeline for one window.
#[derive(Debug, Clone)]
pub struct DriverTimeline<'a> {
    driver_id: &'a DriverId,
    window: &'a TimeWindow,
    /// State in force at `window.start`, if any event precedes it.
    seed: Option<DriverState>,
    /// Events with `window.start <= timestamp < window.end`, in time order.
    in_window: Vec<(DateTime<Utc>, DriverState)>,
}

impl<'a> DriverTimeline<'a> {
    /// Normalizes and orders `events` for `driver_id`.
    ///
    /// Events from other drivers are ignored. Events with tokens missing
    /// from `vocab` are dropped with a warning.
    pub fn new(
        driver_id: &'a DriverId,
        window: &'a TimeWindow,
        events: &[StateEvent],
        vocab: &StateVocabulary,
    ) -> Self {
        let mut normalized: Vec<(DateTime<Utc>, DriverState)> = events
            .iter()
            .filter(|event| &event.driver_id == driver_id)
            .filter_map(|event| {
                let state = vocab.normalize(&event.raw_state);
                if state.is_none() {
                    tracing::warn!(
                        driver = %driver_id,
                        raw_state = %event.raw_state,
                        timestamp = %event.timestamp,
                        "skipping state event with unknown state token"
                    );
                }
                state.map(|s| (event.timestamp, s))
            })
            .collect();
        // Stable: same-timestamp events keep their input order.
        normalized.sort_by_key(|(ts, _)| *ts);

        let seed = normalized
            .iter()
            .take_while(|(ts, _)| *ts < window.start)
            .last()
            .map(|(_, state)| *state);

        let in_window = normalized
            .into_iter()
            .skip_while(|(ts, _)| *ts < window.start)
            .take_while(|(ts, _)| *ts < window.end)
            .collect();

        Self {
            driver_id,
            window,
            seed,
            in_window,
        }
    }

    /// The driver this timeline belongs to.
    pub const fn driver_id(&self) -> &DriverId {
        self.driver_id
    }

    /// The window this timeline covers.
    pub const fn window(&self) -> &TimeWindow {
        self.window
    }

    /// Whether any state event falls inside the window.
    pub fn has_events(&self) -> bool {
        !self.in_window.is_empty()
    }

    /// Distinct normalized states seen in the window, plus the seed.
    pub fn observed_states(&self) -> BTreeSet<DriverState> {
        self.seed
            .into_iter()
            .chain(self.in_window.iter().map(|(_, state)| *state))
            .collect()
    }

    /// Folds the timeline into intervals.
    pub fn intervals(&self) -> Vec<Interval> {
        let mut builder = IntervalBuilder::new(self.driver_id);

        builder.apply(self.window.start, self.seed.unwrap_or(DriverState::Offline));
        for (ts, state) in &self.in_window {
            builder.apply(*ts, *state);
        }

        builder.finish(self.window.end)
    }
}

/// Reconstructs state-log intervals for one driver over `window`.
///
/// Returns an empty list when the driver has no usable state data; that
/// is a normal outcome, not an error.
pub fn reconstruct_intervals(
    driver_id: &DriverId,
    window: &TimeWindow,
    events: &[StateEvent],
    vocab: &StateVocabulary,
) -> Vec<Interval> {
    DriverTimeline::new(driver_id, window, events, vocab).intervals()
}

/// Maps a state to the interval it opens, if any.
const fn interval_kind(state: DriverState) -> Option<IntervalKind> {
    match state {
        DriverState::OnlineWaiting => Some(IntervalKind::Waiting),
        DriverState::OnlineEngaged => Some(IntervalKind::Engaged),
        DriverState::Offline => None,
    }
}

/// Accumulates intervals from a sequence of state transitions.
struct IntervalBuilder<'a> {
    driver_id: &'a DriverId,
    open: Option<(IntervalKind, DateTime<Utc>)>,
    closed: Vec<Interval>,
}

impl<'a> IntervalBuilder<'a> {
    const fn new(driver_id: &'a DriverId) -> Self {
        Self {
            driver_id,
            open: None,
            closed: Vec::new(),
        }
    }

    fn apply(&mut self, at: DateTime<Utc>, state: DriverState) {
        let next = interval_kind(state);
        match (self.open, next) {
            // Repeated state: nothing changes.
            (None, None) => {}
            (Some((current, _)), Some(kind)) if current == kind => {}
            (None, Some(kind)) => self.open = Some((kind, at)),
            (Some(_), Some(kind)) => {
                self.close(at);
                self.open = Some((kind, at));
            }
            (Some(_), None) => self.close(at),
        }
    }

    fn close(&mut self, at: DateTime<Utc>) {
        if let Some((kind, start)) = self.open.take() {
            if at > start {
                self.closed.push(Interval {
                    driver_id: self.driver_id.clone(),
                    start,
                    end: at,
                    kind,
                    source: EstimateSource::StateLog,
                });
            }
        }
    }

    /// Right-censors any open interval at `end`.
    fn finish(mut self, end: DateTime<Utc>) -> Vec<Interval> {
        self.close(end);
        self.closed
    }
}
