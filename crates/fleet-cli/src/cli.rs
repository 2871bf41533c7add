//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use fleet_core::Period;

/// Fleet driver statistics.
///
/// Reconstructs how long drivers were online from their state logs (or
/// their trips when the logs fall short) and reports earnings per driver
/// and for the whole fleet.
#[derive(Debug, Parser)]
#[command(name = "fleet", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the snapshot file (overrides config).
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Evaluate as if the current time were this RFC 3339 instant.
    #[arg(long, global = true, value_name = "TIME")]
    pub now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show statistics for one driver.
    Stats {
        /// Driver id (the vendor's driver UUID).
        #[arg(long)]
        driver: String,

        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show statistics for every driver plus fleet totals.
    Fleet {
        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a driver's reconstructed online intervals and both estimates.
    Intervals {
        /// Driver id (the vendor's driver UUID).
        #[arg(long)]
        driver: String,

        #[command(flatten)]
        period: PeriodArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List drivers present in the snapshot.
    Drivers,
}

/// Reporting period selection. At most one flag may be given.
#[derive(Debug, Clone, Default, Args)]
#[group(multiple = false)]
pub struct PeriodArgs {
    /// A single day (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub day: Option<NaiveDate>,

    /// The Monday-to-Sunday week containing DATE.
    #[arg(long, value_name = "DATE")]
    pub week: Option<NaiveDate>,

    /// The calendar month containing DATE.
    #[arg(long, value_name = "DATE")]
    pub month: Option<NaiveDate>,

    /// The calendar year containing DATE.
    #[arg(long, value_name = "DATE")]
    pub year: Option<NaiveDate>,

    /// An inclusive range of days.
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    pub range: Option<Vec<NaiveDate>>,

    /// The last N days, including today [default: 1].
    #[arg(long, value_name = "N")]
    pub last_days: Option<u32>,

    /// Everything since the fleet started operating.
    #[arg(long)]
    pub all_time: bool,
}

impl PeriodArgs {
    /// The selected period; today when no flag was given.
    pub fn to_period(&self) -> Period {
        if let Some(date) = self.day {
            Period::Day(date)
        } else if let Some(date) = self.week {
            Period::week_containing(date)
        } else if let Some(date) = self.month {
            Period::Month(date)
        } else if let Some(date) = self.year {
            Period::Year(date)
        } else if let Some(&[start, end]) = self.range.as_deref() {
            Period::Custom { start, end }
        } else if self.all_time {
            Period::AllTime
        } else {
            Period::LastNDays(self.last_days.unwrap_or(1))
        }
    }
}
