//! Shared formatting for CLI commands.

use std::fmt::Display;
use std::io::{self, Write};

use fleet_core::{DriverId, Snapshot};

/// Writes one `label value` report line with the value column aligned.
pub fn field<W: Write>(writer: &mut W, label: &str, value: impl Display) -> io::Result<()> {
    writeln!(writer, "{label:<20}{value}")
}

/// Formats fractional hours as a duration string.
/// Returns "Xh Ym" if >= 1 hour, "Xm" if < 1 hour.
/// Negative values are shown as 0m.
#[allow(clippy::cast_possible_truncation)]
pub fn format_hours(hours: f64) -> String {
    if !hours.is_finite() || hours <= 0.0 {
        return "0m".to_string();
    }
    let total_minutes = (hours * 60.0).round() as i64;
    let h = total_minutes / 60;
    let m = total_minutes % 60;

    if h >= 1 {
        format!("{h}h {m}m")
    } else {
        format!("{m}m")
    }
}

/// Formats a currency amount with two decimals.
pub fn format_money(amount: f64) -> String {
    format!("{amount:.2}")
}

/// Driver id, followed by the display name when the snapshot knows it.
pub fn driver_label(snapshot: &Snapshot, driver_id: &DriverId) -> String {
    match snapshot.driver_name(driver_id) {
        Some(name) => format!("{driver_id} ({name})"),
        None => driver_id.to_string(),
    }
}
