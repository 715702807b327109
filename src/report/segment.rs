//! Per-team and per-agent metric bundles.

use crate::models::{MetricBundle, TicketType, TrendPoint};
use crate::report::period::{Granularity, ReportPeriod};
use crate::report::rate::{percentage, DurationStats, Metric};
use crate::report::snapshot::{Directory, ReportRow};
use crate::settings::ReportSettings;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Team,
    Agent,
}

impl Dimension {
    /// Grouping name for a row, or `None` when the joined contact is missing or of the
    /// wrong class.
    fn key(self, row: &ReportRow<'_>, directory: &Directory<'_>) -> Option<String> {
        match self {
            Dimension::Team => directory.team(row.ticket.team_id),
            Dimension::Agent => directory.person(row.ticket.agent_id),
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    count: i64,
    unresolved: i64,
    breached: i64,
    response: DurationStats,
    resolution: DurationStats,
}

impl Accumulator {
    fn push(&mut self, row: &ReportRow<'_>, settings: &ReportSettings) {
        self.count += 1;
        if settings.is_unresolved(row.status()) {
            self.unresolved += 1;
        }
        if row.is_breached() {
            self.breached += 1;
        }
        self.response.push(row.response_time_sec());
        self.resolution.push(row.resolution_time_sec());
    }
}

type GroupKey = (String, String, TicketType);

/// Group rows by (period bucket, dimension, ticket type) and reduce each group to a
/// [`MetricBundle`].
///
/// Output is ordered by period descending, ticket-type label descending, then
/// dimension name ascending.
pub fn aggregate(
    rows: &[ReportRow<'_>],
    dimension: Dimension,
    granularity: Granularity,
    period: &ReportPeriod,
    directory: &Directory<'_>,
    settings: &ReportSettings,
) -> Vec<MetricBundle> {
    let mut groups: HashMap<GroupKey, Accumulator> = HashMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some(name) = dimension.key(row, directory) else {
            skipped += 1;
            continue;
        };
        let bucket = granularity.bucket(period, row.ticket.start_date);
        groups
            .entry((bucket, name, row.ticket_type()))
            .or_default()
            .push(row, settings);
    }

    if skipped > 0 {
        tracing::debug!(?dimension, skipped, "rows without a matching contact");
    }

    let mut keyed: Vec<(TicketType, MetricBundle)> = groups
        .into_iter()
        .map(|((bucket, name, ticket_type), acc)| {
            (ticket_type, to_bundle(bucket, name, ticket_type, &acc, settings))
        })
        .collect();

    // zero-count groups are never reported
    keyed.retain(|(_, b)| b.count > 0);
    // Types configured with the same label still get a stable order.
    keyed.sort_by(|(ta, a), (tb, b)| compare_bundles(a, b).then_with(|| ta.cmp(tb)));
    let bundles: Vec<MetricBundle> = keyed.into_iter().map(|(_, b)| b).collect();

    tracing::debug!(?dimension, groups = bundles.len(), "segments aggregated");
    bundles
}

fn to_bundle(
    period: String,
    dimension_key: String,
    ticket_type: TicketType,
    acc: &Accumulator,
    settings: &ReportSettings,
) -> MetricBundle {
    let (avg_response_min, max_response_min) = match ticket_type {
        TicketType::Change => (Metric::NotApplicable, Metric::NotApplicable),
        TicketType::Request | TicketType::Incident => {
            (acc.response.avg_minutes(), acc.response.max_minutes())
        }
    };

    MetricBundle {
        period,
        dimension_key,
        ticket_type: settings.label(ticket_type).to_string(),
        count: acc.count,
        unresolved_count: acc.unresolved,
        breach_count: acc.breached,
        resolution_rate_pct: percentage(acc.count - acc.unresolved, acc.count),
        timeliness_rate_pct: percentage(acc.count - acc.breached, acc.count),
        avg_response_min,
        avg_resolution_min: acc.resolution.avg_minutes(),
        max_response_min,
        max_resolution_min: acc.resolution.max_minutes(),
    }
}

fn compare_bundles(a: &MetricBundle, b: &MetricBundle) -> Ordering {
    b.period
        .cmp(&a.period)
        .then_with(|| b.ticket_type.cmp(&a.ticket_type))
        .then_with(|| a.dimension_key.cmp(&b.dimension_key))
}

/// Month-by-month service-request resolution rate per team, from monthly team bundles.
/// Team ascending, month ascending. Empty unless the bundles cover at least two months.
pub fn service_request_trend(team_bundles: &[MetricBundle], settings: &ReportSettings) -> Vec<TrendPoint> {
    let months: BTreeSet<&str> = team_bundles.iter().map(|b| b.period.as_str()).collect();
    if months.len() < 2 {
        return Vec::new();
    }
    let request_label = settings.label(TicketType::Request);
    let mut points: Vec<TrendPoint> = team_bundles
        .iter()
        .filter(|b| b.ticket_type == request_label)
        .map(|b| TrendPoint {
            team: b.dimension_key.clone(),
            month: b.period.clone(),
            resolution_rate_pct: b.resolution_rate_pct,
        })
        .collect();
    points.sort_by(|a, b| a.team.cmp(&b.team).then_with(|| a.month.cmp(&b.month)));
    points
}
