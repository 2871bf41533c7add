//! Fleet-wide statistics command.

use std::io::{self, Write};

use anyhow::Result;
use fleet_core::{FleetOutcome, FleetStats, Period, Snapshot};

use super::QueryContext;
use super::util::{driver_label, field, format_hours, format_money};

pub fn run<W: Write>(writer: &mut W, ctx: &QueryContext, period: &Period, json: bool) -> Result<()> {
    let outcome = ctx.engine().fleet_stats(period, ctx.now)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&outcome)?)?;
        return Ok(());
    }

    match &outcome {
        FleetOutcome::Stats(fleet) => write_fleet(writer, &ctx.snapshot, fleet)?,
        FleetOutcome::NoData => {
            writeln!(writer, "FLEET STATS: {}", period.label())?;
            writeln!(writer)?;
            writeln!(writer, "No finished trips in {}.", period.label())?;
        }
    }

    Ok(())
}

fn write_fleet<W: Write>(writer: &mut W, snapshot: &Snapshot, fleet: &FleetStats) -> io::Result<()> {
    writeln!(writer, "FLEET STATS: {}", fleet.period_label)?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:<26}{:>7}{:>10}{:>10}{:>11}  SOURCE",
        "DRIVER", "TRIPS", "GROSS", "ONLINE", "PER HOUR"
    )?;
    for stats in &fleet.drivers {
        writeln!(
            writer,
            "{:<26}{:>7}{:>10}{:>10}{:>11}  {}",
            driver_label(snapshot, &stats.driver_id),
            stats.orders_completed,
            format_money(stats.gross_earnings),
            format_hours(stats.total_online_hours),
            format_money(stats.earnings_per_online_hour),
            stats.duration_source,
        )?;
    }

    let totals = &fleet.totals;
    writeln!(writer)?;
    writeln!(writer, "TOTALS")?;
    writeln!(writer, "──────")?;
    field(writer, "Active drivers:", totals.active_drivers)?;
    field(writer, "Trips completed:", totals.trips_completed)?;
    field(writer, "Gross earnings:", format_money(totals.gross_earnings))?;
    field(writer, "Net earnings:", format_money(totals.net_earnings))?;
    field(writer, "Cash collected:", format_money(totals.cash_collected))?;
    field(writer, "Distance:", format!("{:.1} km", totals.distance_km))?;
    field(writer, "Active time:", format_hours(totals.active_hours))?;
    field(writer, "Waiting time:", format_hours(totals.waiting_hours))?;
    field(writer, "Total online:", format_hours(totals.total_online_hours))?;
    field(writer, "Per trip:", format_money(totals.earnings_per_trip))?;
    field(writer, "Per km:", format_money(totals.earnings_per_km))?;
    field(writer, "Per online hour:", format_money(totals.earnings_per_online_hour))?;

    Ok(())
}
