//! Loading the JSON snapshot of orders and state logs.
//!
//! The snapshot uses the ride-hailing vendor's field names. Records are
//! converted to core types here; malformed ids fail the whole load with
//! the offending record's index, while orders that never finished are
//! skipped.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use fleet_core::{
    DriverId, PaymentMethod, Snapshot, StateEvent, TripId, TripRecord, TripStatus,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    orders: Vec<RawOrder>,
    #[serde(default)]
    state_logs: Vec<RawStateLog>,
}

#[derive(Debug, Deserialize)]
struct RawOrder {
    order_reference: String,
    driver_uuid: String,
    #[serde(default)]
    driver_name: Option<String>,
    order_status: String,
    /// Meters.
    #[serde(default)]
    ride_distance: Option<u32>,
    #[serde(default)]
    order_price: RawPrice,
    #[serde(default)]
    order_accepted_timestamp: Option<i64>,
    #[serde(default)]
    order_finished_timestamp: Option<i64>,
    #[serde(default)]
    payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPrice {
    ride_price: f64,
    net_earnings: f64,
    commission: f64,
}

#[derive(Debug, Deserialize)]
struct RawStateLog {
    driver_uuid: String,
    /// Unix seconds.
    created: i64,
    state: String,
}

/// Reads and converts the snapshot at `path`.
pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    parse_snapshot(&content).with_context(|| format!("invalid snapshot {}", path.display()))
}

/// Converts snapshot JSON into a [`Snapshot`].
pub fn parse_snapshot(json: &str) -> Result<Snapshot> {
    let file: SnapshotFile = serde_json::from_str(json).context("malformed snapshot JSON")?;

    let mut snapshot = Snapshot::default();
    let mut skipped = 0_usize;

    for (index, raw) in file.orders.into_iter().enumerate() {
        let driver_id = DriverId::new(raw.driver_uuid.as_str())
            .with_context(|| format!("order #{index}: invalid driver_uuid"))?;
        if let Some(name) = raw.driver_name.as_deref() {
            snapshot.remember_name(&driver_id, name);
        }
        match convert_order(index, driver_id, raw)? {
            Some(trip) => snapshot.trips.push(trip),
            None => skipped += 1,
        }
    }

    for (index, raw) in file.state_logs.into_iter().enumerate() {
        let driver_id = DriverId::new(raw.driver_uuid)
            .with_context(|| format!("state log #{index}: invalid driver_uuid"))?;
        let timestamp = from_unix(raw.created)
            .with_context(|| format!("state log #{index}: invalid created timestamp"))?;
        snapshot
            .state_events
            .push(StateEvent::new(driver_id, timestamp, raw.state));
    }

    tracing::debug!(
        trips = snapshot.trips.len(),
        skipped_orders = skipped,
        state_events = snapshot.state_events.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

/// Converts one order. Returns `None` for orders with no finish time.
fn convert_order(index: usize, driver_id: DriverId, raw: RawOrder) -> Result<Option<TripRecord>> {
    let trip_id = TripId::new(raw.order_reference)
        .with_context(|| format!("order #{index}: invalid order_reference"))?;

    let Some(finished) = raw.order_finished_timestamp else {
        tracing::debug!(trip = %trip_id, status = %raw.order_status, "order has no finish time; skipped");
        return Ok(None);
    };
    let finished_at = from_unix(finished)
        .with_context(|| format!("order #{index}: invalid order_finished_timestamp"))?;
    let accepted_at = raw
        .order_accepted_timestamp
        .map(from_unix)
        .transpose()
        .with_context(|| format!("order #{index}: invalid order_accepted_timestamp"))?;

    let status: TripStatus = raw.order_status.parse().unwrap_or_else(|never| match never {});
    let payment_method: PaymentMethod = raw
        .payment_method
        .as_deref()
        .unwrap_or("other")
        .parse()
        .unwrap_or_else(|never| match never {});

    Ok(Some(TripRecord {
        trip_id,
        driver_id,
        accepted_at,
        finished_at,
        distance_meters: raw.ride_distance,
        gross_price: raw.order_price.ride_price,
        net_earnings: raw.order_price.net_earnings,
        commission: raw.order_price.commission,
        payment_method,
        status,
    }))
}

fn from_unix(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or_else(|| anyhow!("timestamp {secs} out of range"))
}
