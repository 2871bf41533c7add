//! Interval breakdown command.
//!
//! Shows the reconstructed state-log intervals next to both duration
//! estimates, so it is clear why a driver's hours came from one source.

use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use fleet_core::{DriverBreakdown, DriverId, DurationEstimate, Period};

use super::QueryContext;
use super::util::{driver_label, field, format_hours};

pub fn run<W: Write>(
    writer: &mut W,
    ctx: &QueryContext,
    driver: &str,
    period: &Period,
    json: bool,
) -> Result<()> {
    let driver_id = DriverId::new(driver).context("invalid driver id")?;
    let breakdown = ctx.engine().driver_breakdown(&driver_id, period, ctx.now)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&breakdown)?)?;
        return Ok(());
    }

    let label = driver_label(&ctx.snapshot, &driver_id);
    write_breakdown(writer, &label, &breakdown, &ctx.config.window.timezone)?;
    Ok(())
}

fn write_breakdown<W: Write>(
    writer: &mut W,
    label: &str,
    breakdown: &DriverBreakdown,
    tz: &Tz,
) -> io::Result<()> {
    writeln!(writer, "INTERVALS: {label}")?;
    writeln!(writer, "Period: {}", breakdown.window.label)?;
    writeln!(writer)?;

    if breakdown.intervals.is_empty() {
        writeln!(writer, "(no state-log intervals)")?;
    }
    for interval in &breakdown.intervals {
        writeln!(
            writer,
            "{} - {}  {:<8} {}",
            local(interval.start, tz, "%Y-%m-%d %H:%M"),
            end_time(interval.start, interval.end, tz),
            interval.kind.to_string(),
            format_hours(secs_to_hours(interval.duration_secs())),
        )?;
    }

    writeln!(writer)?;
    field(writer, "State log:", summarize(&breakdown.state_estimate))?;
    field(writer, "Order-derived:", summarize(&breakdown.order_estimate))?;
    field(
        writer,
        "Selected:",
        format!(
            "{} ({})",
            breakdown.selected.estimate.source, breakdown.selected.reason
        ),
    )?;

    Ok(())
}

fn local(ts: DateTime<Utc>, tz: &Tz, fmt: &str) -> String {
    ts.with_timezone(tz).format(fmt).to_string()
}

/// End time, with the date only when it differs from the start's.
fn end_time(start: DateTime<Utc>, end: DateTime<Utc>, tz: &Tz) -> String {
    let same_day = start.with_timezone(tz).date_naive() == end.with_timezone(tz).date_naive();
    if same_day {
        local(end, tz, "%H:%M")
    } else {
        local(end, tz, "%Y-%m-%d %H:%M")
    }
}

fn summarize(estimate: &DurationEstimate) -> String {
    format!(
        "active {}, waiting {}",
        format_hours(estimate.active_hours),
        format_hours(estimate.waiting_hours)
    )
}

#[allow(clippy::cast_precision_loss)]
fn secs_to_hours(secs: i64) -> f64 {
    secs as f64 / 3600.0
}
