//! Per-driver statistics command.

use std::io::{self, Write};

use anyhow::{Context, Result};
use fleet_core::{DriverId, DriverPeriodStats, Period, StatsOutcome};

use super::QueryContext;
use super::util::{driver_label, field, format_hours, format_money};

pub fn run<W: Write>(
    writer: &mut W,
    ctx: &QueryContext,
    driver: &str,
    period: &Period,
    json: bool,
) -> Result<()> {
    let driver_id = DriverId::new(driver).context("invalid driver id")?;
    let outcome = ctx.engine().driver_stats(&driver_id, period, ctx.now)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&outcome)?)?;
        return Ok(());
    }

    let label = driver_label(&ctx.snapshot, &driver_id);
    match &outcome {
        StatsOutcome::Stats(stats) => write_stats(writer, &label, stats)?,
        StatsOutcome::NoData => {
            writeln!(writer, "DRIVER STATS: {label}")?;
            writeln!(writer)?;
            writeln!(writer, "No finished trips in {}.", period.label())?;
        }
    }

    Ok(())
}

fn write_stats<W: Write>(writer: &mut W, label: &str, stats: &DriverPeriodStats) -> io::Result<()> {
    writeln!(writer, "DRIVER STATS: {label}")?;
    writeln!(writer, "Period: {}", stats.period_label)?;

    writeln!(writer)?;
    writeln!(writer, "EARNINGS")?;
    writeln!(writer, "────────")?;
    field(writer, "Orders completed:", stats.orders_completed)?;
    field(writer, "Gross earnings:", format_money(stats.gross_earnings))?;
    field(writer, "Net earnings:", format_money(stats.net_earnings))?;
    field(writer, "Cash collected:", format_money(stats.cash_collected))?;

    writeln!(writer)?;
    writeln!(writer, "TIME")?;
    writeln!(writer, "────")?;
    field(writer, "Active:", format_hours(stats.active_hours))?;
    field(writer, "Waiting:", format_hours(stats.waiting_hours))?;
    field(writer, "Total online:", format_hours(stats.total_online_hours))?;
    field(writer, "Source:", stats.duration_source)?;

    writeln!(writer)?;
    writeln!(writer, "EFFICIENCY")?;
    writeln!(writer, "──────────")?;
    field(writer, "Per active hour:", format_money(stats.earnings_per_active_hour))?;
    field(writer, "Per online hour:", format_money(stats.earnings_per_online_hour))?;
    field(writer, "Per km:", format_money(stats.earnings_per_km))?;
    field(writer, "Distance:", format!("{:.1} km", stats.distance_km))?;
    field(writer, "Avg per trip:", format!("{:.1} km", stats.avg_distance_per_trip))?;

    Ok(())
}
