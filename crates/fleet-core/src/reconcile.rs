//! Picks the trusted duration estimate for a query.
//!
//! Exactly one source wins; the two numbers are never blended. The state
//! log wins only when it is present, recent enough, and shows the driver
//! both waiting and engaged at some point.

use std::fmt;

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::interval::DurationEstimate;
use crate::reconstruct::DriverTimeline;
use crate::state::DriverState;

/// Settings for estimate selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// State logs are not trusted for windows longer than this.
    /// Default: 31 days.
    pub max_state_lookback_days: i64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_state_lookback_days: 31,
        }
    }
}

/// Why a source was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// State log was usable and authoritative.
    StateLog,
    /// No state events for the driver in the window.
    NoStateEvents,
    /// Window is longer than the state-log look-back.
    BeyondLookback,
    /// State events never show both waiting and engaged.
    MissingStateTokens,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StateLog => "state log available",
            Self::NoStateEvents => "no state events in window",
            Self::BeyondLookback => "window exceeds state-log look-back",
            Self::MissingStateTokens => "state log lacks waiting or engaged states",
        };
        write!(f, "{s}")
    }
}

/// The winning estimate and the reason it won.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reconciled {
    pub estimate: DurationEstimate,
    pub reason: SelectionReason,
}

/// Chooses between the state-log estimate and the order-derived estimate.
///
/// `timeline` supplies the evidence for the decision; `state_estimate`
/// should be the estimate built from that timeline's intervals. The
/// look-back is measured in local days of `tz`.
pub fn select_estimate(
    timeline: &DriverTimeline<'_>,
    state_estimate: DurationEstimate,
    order_estimate: DurationEstimate,
    config: &ReconcileConfig,
    tz: &Tz,
) -> Reconciled {
    let reason = selection_reason(timeline, config, tz);

    if reason == SelectionReason::StateLog {
        tracing::debug!(driver = %timeline.driver_id(), "using state-log estimate");
        return Reconciled {
            estimate: state_estimate,
            reason,
        };
    }

    tracing::info!(
        driver = %timeline.driver_id(),
        window = %timeline.window().label,
        %reason,
        "falling back to order-derived estimate"
    );
    Reconciled {
        estimate: order_estimate,
        reason,
    }
}

fn selection_reason(
    timeline: &DriverTimeline<'_>,
    config: &ReconcileConfig,
    tz: &Tz,
) -> SelectionReason {
    if !timeline.has_events() {
        return SelectionReason::NoStateEvents;
    }

    if timeline.window().local_span(tz) > Duration::days(config.max_state_lookback_days) {
        return SelectionReason::BeyondLookback;
    }

    let states = timeline.observed_states();
    if !(states.contains(&DriverState::OnlineWaiting) && states.contains(&DriverState::OnlineEngaged)) {
        return SelectionReason::MissingStateTokens;
    }

    SelectionReason::StateLog
}
