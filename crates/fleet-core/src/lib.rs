//! Core domain logic for fleet driver statistics.
//!
//! This crate contains the fundamental types and logic for:
//! - Windows: resolving reporting periods into UTC ranges
//! - Reconstruction: folding driver state logs into online intervals
//! - Fallback: estimating online time from trip timestamps alone
//! - Reconciliation and aggregation: picking one estimate and building
//!   per-driver and fleet-wide earnings statistics
//!
//! Everything here is pure computation over in-memory records. Loading
//! records is the job of a [`TripSource`] and a [`StateLogSource`].

pub mod engine;
pub mod error;
pub mod fallback;
pub mod interval;
pub mod metrics;
pub mod reconcile;
pub mod reconstruct;
pub mod state;
pub mod trip;
pub mod types;
pub mod window;

pub use engine::{DriverBreakdown, Engine, EngineConfig, Snapshot, StateLogSource, TripSource};
pub use error::EngineError;
pub use fallback::{FallbackConfig, estimate_from_trips};
pub use interval::{DurationEstimate, EstimateSource, Interval, IntervalKind};
pub use metrics::{
    DriverPeriodStats, FleetOutcome, FleetStats, FleetTotals, StatsOutcome, aggregate,
    aggregate_fleet,
};
pub use reconcile::{ReconcileConfig, Reconciled, SelectionReason, select_estimate};
pub use reconstruct::{DriverTimeline, reconstruct_intervals};
pub use state::{DriverState, StateEvent, StateVocabulary, UnknownDriverState};
pub use trip::{PaymentMethod, TripRecord, TripStatus};
pub use types::{DriverId, TripId, ValidationError};
pub use window::{Period, TimeWindow, WindowConfig, resolve_window};
