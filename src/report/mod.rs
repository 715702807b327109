//! Metrics core: a pure computation over one immutable [`TicketSnapshot`].

pub mod assemble;
pub mod overdue;
pub mod period;
pub mod rate;
pub mod segment;
pub mod snapshot;
pub mod summary;
pub mod unresolved;

#[cfg(test)]
pub mod fixtures;

use crate::models::TicketType;
use crate::settings::ReportSettings;
use assemble::Report;
use period::{Granularity, ReportPeriod};
use segment::Dimension;
use snapshot::TicketSnapshot;
use std::thread;

/// Run the five independent aggregations concurrently and assemble the result.
///
/// Never fails: an empty snapshot or a degenerate period yields no-activity summaries
/// and empty tables.
pub fn compute(
    snapshot: &TicketSnapshot,
    period: &ReportPeriod,
    granularity: Granularity,
    settings: &ReportSettings,
) -> Report {
    let rows = snapshot.rows(period, settings);
    let directory = snapshot.directory();
    tracing::info!(period = %period.label(), rows = rows.len(), ?granularity, "computing report");

    let (summaries, team_segments, agent_segments, unresolved_tickets, overdue_by_status) =
        thread::scope(|s| {
            let summaries = s.spawn(|| {
                (
                    summary::ticket_summary(&rows),
                    summary::subtype_summary(&rows, TicketType::Request, settings),
                    summary::subtype_summary(&rows, TicketType::Incident, settings),
                    summary::subtype_summary(&rows, TicketType::Change, settings),
                )
            });
            let teams = s.spawn(|| {
                segment::aggregate(&rows, Dimension::Team, granularity, period, &directory, settings)
            });
            let agents = s.spawn(|| {
                segment::aggregate(&rows, Dimension::Agent, granularity, period, &directory, settings)
            });
            let unresolved = s.spawn(|| unresolved::find(&rows, &directory, settings));
            let overdue = s.spawn(|| overdue::find(&rows, &directory, settings));

            (
                join(summaries),
                join(teams),
                join(agents),
                join(unresolved),
                join(overdue),
            )
        });

    let service_request_trend = match granularity {
        Granularity::Monthly => segment::service_request_trend(&team_segments, settings),
        Granularity::WholeRange => Vec::new(),
    };

    let (ticket_summary, request_summary, incident_summary, change_summary) = summaries;
    Report {
        period: *period,
        granularity,
        ticket_summary,
        request_summary,
        incident_summary,
        change_summary,
        team_segments,
        agent_segments,
        unresolved_tickets,
        overdue_by_status,
        service_request_trend,
    }
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}
