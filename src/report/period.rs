//! Reporting window and period-bucket granularity.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// `[start, end)` in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// The calendar month before the one containing `today`.
    pub fn previous_month(today: NaiveDate) -> Self {
        let this_month = first_of_month(today);
        Self::new(first_of_month(this_month - Duration::days(1)), this_month)
    }

    /// The calendar month containing `day`.
    pub fn month_of(day: NaiveDate) -> Self {
        let start = first_of_month(day);
        Self::new(start, first_of_month(start + Duration::days(31)))
    }

    /// Fill in whichever bound the operator left out.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Self {
        match (start, end) {
            (Some(s), Some(e)) => Self::new(s, e),
            (Some(s), None) => Self::new(s, Self::month_of(s).end),
            (None, Some(e)) => Self::new(first_of_month(e - Duration::days(1)), e),
            (None, None) => Self::previous_month(today),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.start >= self.end
    }

    pub fn start_bound(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    pub fn end_bound(&self) -> NaiveDateTime {
        self.end.and_time(NaiveTime::MIN)
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start_bound() && ts < self.end_bound()
    }

    /// True when the covered days fall in more than one calendar month.
    pub fn spans_multiple_months(&self) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let last_day = self.end - Duration::days(1);
        (self.start.year(), self.start.month()) != (last_day.year(), last_day.month())
    }

    /// `2024-01` for a single month, `2024-01 .. 2024-03` otherwise.
    pub fn label(&self) -> String {
        if self.is_degenerate() {
            return format!("{} .. {}", self.start, self.end);
        }
        let first = self.start.format("%Y-%m").to_string();
        if self.spans_multiple_months() {
            let last_day = self.end - Duration::days(1);
            format!("{} .. {}", first, last_day.format("%Y-%m"))
        } else {
            first
        }
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    WholeRange,
    Monthly,
}

impl Granularity {
    pub const CHOICES: &'static str = "auto, range, month";

    /// Monthly buckets only when the period crosses a month boundary.
    pub fn for_period(period: &ReportPeriod) -> Self {
        if period.spans_multiple_months() {
            Granularity::Monthly
        } else {
            Granularity::WholeRange
        }
    }

    pub fn parse(s: &str, period: &ReportPeriod) -> Option<Self> {
        match s {
            "auto" => Some(Self::for_period(period)),
            "range" => Some(Granularity::WholeRange),
            "month" => Some(Granularity::Monthly),
            _ => None,
        }
    }

    pub fn bucket(&self, period: &ReportPeriod, start_date: NaiveDateTime) -> String {
        match self {
            Granularity::WholeRange => period.label(),
            Granularity::Monthly => start_date.format("%Y-%m").to_string(),
        }
    }
}
