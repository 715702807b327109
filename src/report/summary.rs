//! Headline counts and per-subtype summaries.

use crate::models::{PieSlice, SubtypeSummary, SummaryBundle, SummaryRates, TicketSummary, TicketType};
use crate::report::rate::percentage;
use crate::report::snapshot::ReportRow;
use crate::settings::ReportSettings;

pub fn ticket_summary(rows: &[ReportRow<'_>]) -> TicketSummary {
    let mut summary = TicketSummary::default();
    for row in rows {
        summary.total += 1;
        match row.ticket_type() {
            TicketType::Request => summary.request_total += 1,
            TicketType::Incident => summary.incident_total += 1,
            TicketType::Change => summary.change_total += 1,
        }
    }
    summary
}

/// One summary for `ticket_type`, or an explicit no-activity result when the period
/// holds none of them.
pub fn subtype_summary(
    rows: &[ReportRow<'_>],
    ticket_type: TicketType,
    settings: &ReportSettings,
) -> SubtypeSummary {
    let label = settings.label(ticket_type).to_string();

    let mut total = 0i64;
    let mut resolved_total = 0i64;
    let mut closed_total = 0i64;
    for row in rows.iter().filter(|r| r.ticket_type() == ticket_type) {
        total += 1;
        if settings.is_resolved(row.status()) {
            resolved_total += 1;
        }
        if settings.is_closed(row.status()) {
            closed_total += 1;
        }
    }

    if total == 0 {
        return SubtypeSummary::NoActivity { ticket_type: label };
    }

    let unresolved_total = total - resolved_total;
    let (rates, slices) = match ticket_type {
        TicketType::Change => (
            SummaryRates::Change {
                closed_pct: percentage(closed_total, total),
                execution_success_pct: percentage(resolved_total, closed_total),
            },
            pie(&[("Resolved", resolved_total), ("Unresolved", total - resolved_total)]),
        ),
        TicketType::Request | TicketType::Incident => (
            SummaryRates::Handling {
                resolved_pct: percentage(resolved_total, total),
                closed_pct: percentage(closed_total, resolved_total),
                unresolved_pct: percentage(unresolved_total, total),
            },
            pie(&[
                ("Resolved", resolved_total),
                ("Unresolved", unresolved_total),
                ("Closed", closed_total),
            ]),
        ),
    };

    SubtypeSummary::Active(SummaryBundle {
        ticket_type: label,
        total,
        resolved_total,
        closed_total,
        unresolved_total,
        rates,
        slices,
    })
}

fn pie(parts: &[(&str, i64)]) -> Vec<PieSlice> {
    let sum: i64 = parts.iter().map(|(_, v)| v).sum();
    parts
        .iter()
        .map(|(label, value)| PieSlice {
            label: (*label).to_string(),
            value: *value,
            share_pct: percentage(*value, sum),
        })
        .collect()
}

impl SubtypeSummary {
    pub fn ticket_type(&self) -> &str {
        match self {
            SubtypeSummary::NoActivity { ticket_type } => ticket_type,
            SubtypeSummary::Active(b) => &b.ticket_type,
        }
    }

    pub fn slices(&self) -> &[PieSlice] {
        match self {
            SubtypeSummary::NoActivity { .. } => &[],
            SubtypeSummary::Active(b) => &b.slices,
        }
    }

    /// One-sentence description for the text renderers.
    pub fn headline(&self) -> String {
        let b = match self {
            SubtypeSummary::NoActivity { ticket_type } => {
                return format!("{}: no activity in this period.", ticket_type);
            }
            SubtypeSummary::Active(b) => b,
        };
        match &b.rates {
            SummaryRates::Handling {
                resolved_pct,
                closed_pct,
                unresolved_pct,
            } => format!(
                "{}: {} received, {} resolved ({}%); {} of the resolved closed ({}%); {} unresolved ({}%).",
                b.ticket_type,
                b.total,
                b.resolved_total,
                resolved_pct,
                b.closed_total,
                closed_pct,
                b.unresolved_total,
                unresolved_pct
            ),
            SummaryRates::Change {
                closed_pct,
                execution_success_pct,
            } => format!(
                "{}: {} received, {} closed ({}%); {} of the closed executed successfully ({}%).",
                b.ticket_type,
                b.total,
                b.closed_total,
                closed_pct,
                b.resolved_total,
                execution_success_pct
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{self, Fixture};
    use crate::report::rate::Metric;

    fn requests(statuses: &[&str]) -> Fixture {
        let mut fx = Fixture::new();
        for (i, status) in statuses.iter().enumerate() {
            fx.request(i as i64 + 1, status);
        }
        fx
    }

    #[test]
    fn ten_requests_seven_resolved_four_closed() {
        let fx = requests(&[
            "closed", "closed", "closed", "closed", "resolved", "resolved", "resolved",
            "assigned", "pending", "escalated_tto",
        ]);
        let settings = ReportSettings::default();
        let rows = fx.snapshot.rows(&fixtures::january(), &settings);

        let SubtypeSummary::Active(b) = subtype_summary(&rows, TicketType::Request, &settings) else {
            panic!("expected an active summary");
        };
        assert_eq!(b.total, 10);
        assert_eq!(b.resolved_total, 7);
        assert_eq!(b.closed_total, 4);
        assert_eq!(b.unresolved_total, 3);
        assert_eq!(
            b.rates,
            SummaryRates::Handling {
                resolved_pct: Metric::Value(70.0),
                closed_pct: Metric::Value(57.14),
                unresolved_pct: Metric::Value(30.0),
            }
        );
        let values: Vec<i64> = b.slices.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![7, 3, 4]);
    }

    #[test]
    fn new_tickets_are_not_counted() {
        let fx = requests(&["new", "new", "resolved"]);
        let settings = ReportSettings::default();
        let rows = fx.snapshot.rows(&fixtures::january(), &settings);
        assert_eq!(ticket_summary(&rows).total, 1);
        let SubtypeSummary::Active(b) = subtype_summary(&rows, TicketType::Request, &settings) else {
            panic!("expected an active summary");
        };
        assert_eq!(b.total, 1);
        assert_eq!(b.unresolved_total, b.total - b.resolved_total);
    }

    #[test]
    fn empty_subtype_reports_no_activity() {
        let fx = requests(&["assigned"]);
        let settings = ReportSettings::default();
        let rows = fx.snapshot.rows(&fixtures::january(), &settings);
        let summary = subtype_summary(&rows, TicketType::Incident, &settings);
        assert_eq!(
            summary,
            SubtypeSummary::NoActivity {
                ticket_type: "Incident".to_string()
            }
        );
        assert!(summary.slices().is_empty());
        assert_eq!(summary.headline(), "Incident: no activity in this period.");
    }

    #[test]
    fn change_summary_measures_execution_against_closed() {
        let mut fx = Fixture::new();
        fx.change(1, "closed");
        fx.change(2, "closed");
        fx.change(3, "implemented");
        fx.change(4, "new");
        let settings = ReportSettings::default();
        let rows = fx.snapshot.rows(&fixtures::january(), &settings);

        let summary = subtype_summary(&rows, TicketType::Change, &settings);
        let SubtypeSummary::Active(b) = &summary else {
            panic!("expected an active summary");
        };
        assert_eq!((b.total, b.closed_total, b.resolved_total), (3, 2, 2));
        assert_eq!(
            b.rates,
            SummaryRates::Change {
                closed_pct: Metric::Value(66.67),
                execution_success_pct: Metric::Value(100.0),
            }
        );
        let values: Vec<i64> = b.slices.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2, 1]);
        assert!(summary.headline().starts_with("Change: 3 received, 2 closed (66.67%)"));
    }

    #[test]
    fn closed_rate_without_resolved_is_not_applicable() {
        let fx = requests(&["assigned", "pending"]);
        let settings = ReportSettings::default();
        let rows = fx.snapshot.rows(&fixtures::january(), &settings);
        let SubtypeSummary::Active(b) = subtype_summary(&rows, TicketType::Request, &settings) else {
            panic!("expected an active summary");
        };
        let SummaryRates::Handling { closed_pct, .. } = b.rates else {
            panic!("expected handling rates");
        };
        assert_eq!(closed_pct, Metric::NotApplicable);
    }

    #[test]
    fn ticket_summary_counts_each_subtype_and_skips_problems() {
        let mut fx = Fixture::new();
        fx.request(1, "assigned");
        fx.incident(2, "resolved");
        fx.change(3, "closed");
        fx.problem(4);
        let rows = fx.snapshot.rows(&fixtures::january(), &ReportSettings::default());
        assert_eq!(
            ticket_summary(&rows),
            TicketSummary {
                total: 3,
                request_total: 1,
                incident_total: 1,
                change_total: 1,
            }
        );
    }
}
