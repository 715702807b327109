pub mod config;
pub mod export;
pub mod import;
pub mod init;
pub mod report;
pub mod schema;

use crate::cli::PeriodArgs;
use crate::error::DeskError;
use crate::report::assemble::Report;
use crate::report::period::{Granularity, ReportPeriod};
use crate::settings::ReportSettings;
use crate::db::SqliteSource;
use crate::source::fetch_snapshot;
use chrono::{Local, NaiveDate};
use rusqlite::Connection;

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, DeskError> {
    raw.map(|s| {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| DeskError::InvalidDate(s.to_string()))
    })
    .transpose()
}

/// Resolve the reporting window from CLI flags, defaulting relative to `today`.
pub fn resolve_period(args: &PeriodArgs, today: NaiveDate) -> Result<(ReportPeriod, Granularity), DeskError> {
    let start = parse_date(args.start.as_deref())?;
    let end = parse_date(args.end.as_deref())?;
    let period = ReportPeriod::resolve(start, end, today);
    let granularity = Granularity::parse(&args.granularity, &period).ok_or_else(|| DeskError::InvalidValue {
        field: "granularity".to_string(),
        value: args.granularity.clone(),
        valid: Granularity::CHOICES.to_string(),
    })?;
    Ok((period, granularity))
}

/// Fetch the period's rows from the store and compute every report output.
pub fn load_report(conn: &Connection, args: &PeriodArgs) -> Result<Report, DeskError> {
    let (period, granularity) = resolve_period(args, Local::now().date_naive())?;
    let settings = ReportSettings::load(conn);
    let snapshot = fetch_snapshot(&SqliteSource::new(conn), &period)?;
    Ok(crate::report::compute(&snapshot, &period, granularity, &settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn args(start: Option<&str>, end: Option<&str>, granularity: &str) -> PeriodArgs {
        PeriodArgs {
            start: start.map(String::from),
            end: end.map(String::from),
            granularity: granularity.to_string(),
        }
    }

    #[test]
    fn no_dates_means_previous_month() {
        let (period, granularity) = resolve_period(&args(None, None, "auto"), d(2024, 3, 15)).unwrap();
        assert_eq!(period, ReportPeriod::new(d(2024, 2, 1), d(2024, 3, 1)));
        assert_eq!(granularity, Granularity::WholeRange);
    }

    #[test]
    fn multi_month_range_buckets_by_month() {
        let (_, granularity) =
            resolve_period(&args(Some("2024-01-01"), Some("2024-04-01"), "auto"), d(2024, 5, 1)).unwrap();
        assert_eq!(granularity, Granularity::Monthly);
        let (_, granularity) =
            resolve_period(&args(Some("2024-01-01"), Some("2024-04-01"), "range"), d(2024, 5, 1)).unwrap();
        assert_eq!(granularity, Granularity::WholeRange);
    }

    #[test]
    fn bad_date_is_rejected() {
        let err = resolve_period(&args(Some("2024-13-01"), None, "auto"), d(2024, 5, 1)).unwrap_err();
        assert!(matches!(err, DeskError::InvalidDate(ref s) if s == "2024-13-01"));
    }

    #[test]
    fn bad_granularity_is_rejected() {
        let err = resolve_period(&args(None, None, "weekly"), d(2024, 5, 1)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VALUE");
    }
}
