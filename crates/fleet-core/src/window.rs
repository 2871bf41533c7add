//! Calendar period resolution.
//!
//! Turns a logical period (a day, a month, "the last 7 days", ...) into a
//! concrete half-open `[start, end)` UTC window. Calendar units are laid
//! out in the fleet's civil timezone and then converted to UTC.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveTime, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Calendar settings for window resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// First day the fleet operated. No window starts before its local midnight.
    pub operational_epoch: NaiveDate,

    /// Civil timezone used for calendar boundaries.
    pub timezone: Tz,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            operational_epoch: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap_or(NaiveDate::MIN),
            timezone: Tz::UTC,
        }
    }
}

/// A logical reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// A single local calendar day.
    Day(NaiveDate),
    /// Local dates `start..=end`, normally Monday to Sunday.
    Week { start: NaiveDate, end: NaiveDate },
    /// The calendar month containing the date.
    Month(NaiveDate),
    /// The calendar year containing the date.
    Year(NaiveDate),
    /// Arbitrary local dates `start..=end`.
    Custom { start: NaiveDate, end: NaiveDate },
    /// Today plus the preceding `n - 1` full local days, up to now.
    LastNDays(u32),
    /// Everything since the operational epoch.
    AllTime,
}

impl Period {
    /// The Monday-to-Sunday week containing `date`.
    pub fn week_containing(date: NaiveDate) -> Self {
        let monday = date.week(chrono::Weekday::Mon).first_day();
        let sunday = date.week(chrono::Weekday::Mon).last_day();
        Self::Week {
            start: monday,
            end: sunday,
        }
    }

    /// Human-readable label for reports.
    pub fn label(&self) -> String {
        match self {
            Self::Day(date) => date.format("%b %-d, %Y").to_string(),
            Self::Week { start, end } | Self::Custom { start, end } => {
                let start_fmt = if start.year() == end.year() {
                    "%b %-d"
                } else {
                    "%b %-d, %Y"
                };
                format!("{} - {}", start.format(start_fmt), end.format("%b %-d, %Y"))
            }
            Self::Month(date) => date.format("%B %Y").to_string(),
            Self::Year(date) => date.format("%Y").to_string(),
            Self::LastNDays(1) => "Today".to_string(),
            Self::LastNDays(n) => format!("Last {n} days"),
            Self::AllTime => "All Time".to_string(),
        }
    }
}

/// A resolved half-open UTC window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

impl TimeWindow {
    /// Builds a window directly, rejecting `start >= end`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        label: impl Into<String>,
    ) -> Result<Self, EngineError> {
        if start >= end {
            return Err(EngineError::InvalidWindow { start, end });
        }
        Ok(Self {
            start,
            end,
            label: label.into(),
        })
    }

    /// Window length.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Window length on the local wall clock of `tz`.
    ///
    /// A calendar month in a DST zone is a whole number of local days even
    /// when its UTC length is an hour more or less.
    pub fn local_span(&self, tz: &Tz) -> Duration {
        let start = self.start.with_timezone(tz).naive_local();
        let end = self.end.with_timezone(tz).naive_local();
        end - start
    }

    /// Whether `ts` falls in `[start, end)`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Resolves `period` against `now`.
///
/// Every window is clamped to `[operational epoch, now)`. Calendar
/// arithmetic that leaves chrono's date range saturates instead of
/// failing, so the clamp still applies. Fails with
/// [`EngineError::InvalidWindow`] when nothing is left after clamping.
pub fn resolve_window(
    period: &Period,
    now: DateTime<Utc>,
    config: &WindowConfig,
) -> Result<TimeWindow, EngineError> {
    let tz = &config.timezone;
    let today = now.with_timezone(tz).date_naive();
    let epoch = local_midnight_to_utc(tz, config.operational_epoch);

    let (start, end) = match *period {
        Period::Day(date) => (local_midnight_to_utc(tz, date), midnight_after(tz, date)),
        Period::Week { start, end } | Period::Custom { start, end } => {
            (local_midnight_to_utc(tz, start), midnight_after(tz, end))
        }
        Period::Month(date) => {
            let first = date.with_day(1).unwrap_or(date);
            let next = first.checked_add_months(Months::new(1));
            (local_midnight_to_utc(tz, first), saturating_midnight(tz, next))
        }
        Period::Year(date) => {
            let first = date.with_ordinal(1).unwrap_or(date);
            let next = NaiveDate::from_ymd_opt(date.year() + 1, 1, 1);
            (local_midnight_to_utc(tz, first), saturating_midnight(tz, next))
        }
        Period::LastNDays(0) => (midnight_after(tz, today), now),
        Period::LastNDays(n) => {
            let first_day = today
                .checked_sub_days(Days::new(u64::from(n - 1)))
                .unwrap_or(config.operational_epoch);
            (local_midnight_to_utc(tz, first_day), now)
        }
        Period::AllTime => (epoch, now),
    };

    let start = start.max(epoch);
    let end = end.min(now);
    TimeWindow::new(start, end, period.label())
}

/// Converts a local date at midnight to UTC.
/// Ambiguous midnights (DST fall-back) take the earlier instant; a
/// midnight skipped by spring-forward moves to 01:00 local.
fn local_midnight_to_utc(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => midnight
            .checked_add_signed(Duration::hours(1))
            .and_then(|one_am| tz.from_local_datetime(&one_am).earliest())
            .map_or_else(
                || Utc.from_utc_datetime(&midnight),
                |dt| dt.with_timezone(&Utc),
            ),
    }
}

/// Local midnight ending `date`.
fn midnight_after(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    saturating_midnight(tz, date.succ_opt())
}

/// Past the last representable date every window end is beyond `now`.
fn saturating_midnight(tz: &Tz, date: Option<NaiveDate>) -> DateTime<Utc> {
    date.map_or(DateTime::<Utc>::MAX_UTC, |date| local_midnight_to_utc(tz, date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    /// Tallinn is UTC+3 in summer, UTC+2 in winter.
    fn tallinn() -> WindowConfig {
        WindowConfig {
            operational_epoch: date(2025, 8, 1),
            timezone: chrono_tz::Europe::Tallinn,
        }
    }

    #[test]
    fn test_day_uses_local_midnights() {
        let now = utc(2025, 12, 1, 12, 0);
        let window = resolve_window(&Period::Day(date(2025, 8, 27)), now, &tallinn()).unwrap();

        assert_eq!(window.start, utc(2025, 8, 26, 21, 0));
        assert_eq!(window.end, utc(2025, 8, 27, 21, 0));
        assert_eq!(window.label, "Aug 27, 2025");
    }

    #[test]
    fn test_day_in_progress_ends_now() {
        let now = utc(2025, 8, 27, 10, 0);
        let window = resolve_window(&Period::Day(date(2025, 8, 27)), now, &tallinn()).unwrap();
        assert_eq!(window.end, now);
    }

    #[test]
    fn test_last_one_day_is_today_only() {
        let now = utc(2025, 8, 27, 10, 0);
        let window = resolve_window(&Period::LastNDays(1), now, &tallinn()).unwrap();

        assert_eq!(window.start, utc(2025, 8, 26, 21, 0));
        assert_eq!(window.end, now);
        assert_eq!(window.label, "Today");
    }

    #[test]
    fn test_last_two_days_includes_yesterday() {
        let now = utc(2025, 8, 27, 10, 0);
        let window = resolve_window(&Period::LastNDays(2), now, &tallinn()).unwrap();

        assert_eq!(window.start, utc(2025, 8, 25, 21, 0));
        assert_eq!(window.end, now);
        assert_eq!(window.label, "Last 2 days");
    }

    #[test]
    fn test_last_n_days_follows_local_calendar() {
        // 22:30 UTC on the 26th is already 01:30 on the 27th in Tallinn.
        let now = utc(2025, 8, 26, 22, 30);
        let window = resolve_window(&Period::LastNDays(1), now, &tallinn()).unwrap();
        assert_eq!(window.start, utc(2025, 8, 26, 21, 0));
    }

    #[test]
    fn test_last_zero_days_is_invalid() {
        let now = utc(2025, 8, 27, 10, 0);
        let err = resolve_window(&Period::LastNDays(0), now, &tallinn()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidWindow { .. }));
    }

    #[test]
    fn test_month_spans_dst_change() {
        let now = utc(2026, 1, 1, 0, 0);
        let window = resolve_window(&Period::Month(date(2025, 10, 15)), now, &tallinn()).unwrap();

        assert_eq!(window.start, utc(2025, 9, 30, 21, 0));
        assert_eq!(window.end, utc(2025, 10, 31, 22, 0));
        assert_eq!(window.label, "October 2025");
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let now = utc(2026, 3, 1, 0, 0);
        let window = resolve_window(&Period::Month(date(2025, 12, 3)), now, &tallinn()).unwrap();
        assert_eq!(window.end, utc(2025, 12, 31, 22, 0));
    }

    #[test]
    fn test_year_is_clamped_to_epoch_and_now() {
        let now = utc(2025, 9, 10, 8, 0);
        let window = resolve_window(&Period::Year(date(2025, 3, 1)), now, &tallinn()).unwrap();

        assert_eq!(window.start, utc(2025, 7, 31, 21, 0));
        assert_eq!(window.end, now);
        assert_eq!(window.label, "2025");
    }

    #[test]
    fn test_all_time_starts_at_epoch() {
        let now = utc(2025, 9, 10, 8, 0);
        let window = resolve_window(&Period::AllTime, now, &tallinn()).unwrap();

        assert_eq!(window.start, utc(2025, 7, 31, 21, 0));
        assert_eq!(window.end, now);
        assert_eq!(window.label, "All Time");
    }

    #[test]
    fn test_week_end_date_is_inclusive() {
        let now = utc(2026, 1, 1, 0, 0);
        let period = Period::week_containing(date(2025, 8, 27));
        assert_eq!(
            period,
            Period::Week {
                start: date(2025, 8, 25),
                end: date(2025, 8, 31)
            }
        );

        let window = resolve_window(&period, now, &tallinn()).unwrap();
        assert_eq!(window.start, utc(2025, 8, 24, 21, 0));
        assert_eq!(window.end, utc(2025, 8, 31, 21, 0));
        assert_eq!(window.label, "Aug 25 - Aug 31, 2025");
        assert_eq!(window.duration(), Duration::days(7));
    }

    #[test]
    fn test_custom_range_reversed_is_invalid() {
        let now = utc(2026, 1, 1, 0, 0);
        let period = Period::Custom {
            start: date(2025, 9, 10),
            end: date(2025, 9, 1),
        };
        assert!(matches!(
            resolve_window(&period, now, &tallinn()),
            Err(EngineError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn test_day_before_epoch_is_invalid() {
        let now = utc(2026, 1, 1, 0, 0);
        let result = resolve_window(&Period::Day(date(2025, 7, 1)), now, &tallinn());
        assert!(matches!(result, Err(EngineError::InvalidWindow { .. })));
    }

    #[test]
    fn test_future_day_is_invalid() {
        let now = utc(2025, 8, 27, 10, 0);
        let result = resolve_window(&Period::Day(date(2025, 8, 29)), now, &tallinn());
        assert!(matches!(result, Err(EngineError::InvalidWindow { .. })));
    }

    #[test]
    fn test_huge_last_n_days_clamps_to_epoch() {
        let now = utc(2025, 9, 10, 8, 0);
        let window =
            resolve_window(&Period::LastNDays(200_000_000), now, &WindowConfig::default()).unwrap();

        assert_eq!(window.start, utc(2025, 8, 1, 0, 0));
        assert_eq!(window.end, now);
        assert_eq!(window.label, "Last 200000000 days");
    }

    #[test]
    fn test_last_representable_day_is_clamped_to_now() {
        let now = utc(2025, 9, 10, 8, 0);
        for period in [
            Period::Day(NaiveDate::MAX),
            Period::Month(NaiveDate::MAX),
            Period::Year(NaiveDate::MAX),
            Period::Custom {
                start: NaiveDate::MAX,
                end: NaiveDate::MAX,
            },
        ] {
            let result = resolve_window(&period, now, &tallinn());
            assert!(
                matches!(result, Err(EngineError::InvalidWindow { end, .. }) if end == now),
                "{period:?}: {result:?}"
            );
        }
    }

    #[test]
    fn test_custom_range_open_ended_at_max_date_ends_now() {
        let now = utc(2025, 9, 10, 8, 0);
        let period = Period::Custom {
            start: date(2025, 9, 1),
            end: NaiveDate::MAX,
        };
        let window = resolve_window(&period, now, &tallinn()).unwrap();
        assert_eq!(window.start, utc(2025, 8, 31, 21, 0));
        assert_eq!(window.end, now);
    }

    /// Havana switches clocks at midnight: UTC-5 in winter, UTC-4 in summer.
    fn havana() -> WindowConfig {
        WindowConfig {
            operational_epoch: date(2025, 1, 1),
            timezone: chrono_tz::America::Havana,
        }
    }

    #[test]
    fn test_ambiguous_midnight_takes_earlier_instant() {
        // 2025-11-02 01:00 CDT falls back to 00:00 CST, so midnight occurs twice.
        let now = utc(2026, 1, 1, 0, 0);
        let window = resolve_window(&Period::Day(date(2025, 11, 2)), now, &havana()).unwrap();

        assert_eq!(window.start, utc(2025, 11, 2, 4, 0));
        assert_eq!(window.end, utc(2025, 11, 3, 5, 0));
        assert_eq!(window.duration(), Duration::hours(25));
    }

    #[test]
    fn test_skipped_midnight_moves_to_one_am() {
        // 2025-03-09 00:00 CST jumps straight to 01:00 CDT.
        let now = utc(2026, 1, 1, 0, 0);
        let window = resolve_window(&Period::Day(date(2025, 3, 9)), now, &havana()).unwrap();

        assert_eq!(window.start, utc(2025, 3, 9, 5, 0));
        assert_eq!(window.end, utc(2025, 3, 10, 4, 0));
        assert_eq!(window.duration(), Duration::hours(23));

        let previous = resolve_window(&Period::Day(date(2025, 3, 8)), now, &havana()).unwrap();
        assert_eq!(previous.end, window.start);
    }

    #[test]
    fn test_month_local_span_ignores_dst_hour() {
        let now = utc(2026, 1, 1, 0, 0);
        let window = resolve_window(&Period::Month(date(2025, 10, 1)), now, &tallinn()).unwrap();

        assert_eq!(window.duration(), Duration::days(31) + Duration::hours(1));
        assert_eq!(window.local_span(&chrono_tz::Europe::Tallinn), Duration::days(31));
    }

    #[test]
    fn test_custom_label_across_years_shows_both_years() {
        let period = Period::Custom {
            start: date(2025, 12, 25),
            end: date(2026, 1, 3),
        };
        assert_eq!(period.label(), "Dec 25, 2025 - Jan 3, 2026");
    }

    #[test]
    fn test_contains_is_half_open() {
        let window = TimeWindow::new(utc(2025, 8, 27, 0, 0), utc(2025, 8, 28, 0, 0), "x").unwrap();
        assert!(window.contains(utc(2025, 8, 27, 0, 0)));
        assert!(!window.contains(utc(2025, 8, 28, 0, 0)));
    }

    #[test]
    fn test_config_deserializes_timezone_by_name() {
        let config: WindowConfig = serde_json::from_str(
            r#"{"operational_epoch": "2025-08-01", "timezone": "Europe/Tallinn"}"#,
        )
        .unwrap();
        assert_eq!(config, tallinn());
    }
}
