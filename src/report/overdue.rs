//! SLA-breached requests and incidents, reduced to one row per status.
//!
//! Each status group is represented by its first ticket (lowest id): reference, title,
//! overrun and names come from that ticket, while the response and resolution averages
//! and `ticket_count` cover the whole group.

use crate::models::{OverdueGroup, SlaDetail};
use crate::report::rate::{minutes, DurationStats, Metric};
use crate::report::snapshot::{Directory, ReportRow};
use crate::settings::ReportSettings;
use std::collections::BTreeMap;

struct Group<'a> {
    first: ReportRow<'a>,
    sla: &'a SlaDetail,
    count: i64,
    response: DurationStats,
    resolution: DurationStats,
}

/// Groups ordered by status.
pub fn find(
    rows: &[ReportRow<'_>],
    directory: &Directory<'_>,
    settings: &ReportSettings,
) -> Vec<OverdueGroup> {
    let mut groups: BTreeMap<&str, Group<'_>> = BTreeMap::new();

    for row in rows {
        // Changes carry no SLA detail and fall out here.
        let Some(sla) = row.detail.sla() else {
            continue;
        };
        if !(sla.tto_75_passed || sla.ttr_75_passed) {
            continue;
        }
        let group = groups.entry(row.status()).or_insert_with(|| Group {
            first: *row,
            sla,
            count: 0,
            response: DurationStats::default(),
            resolution: DurationStats::default(),
        });
        group.count += 1;
        group.response.push(row.response_time_sec());
        group.resolution.push(row.resolution_time_sec());
    }

    groups
        .into_iter()
        .filter(|(_, g)| g.count > 0)
        .map(|(status, g)| {
            let ticket = g.first.ticket;
            OverdueGroup {
                status: status.to_string(),
                ticket_count: g.count,
                reference: ticket.reference.clone(),
                title: ticket.title.clone(),
                ticket_type: settings.label(g.first.ticket_type()).to_string(),
                start_date: ticket.start_date,
                last_update: ticket.last_update,
                tto_overrun_min: overrun(g.sla.tto_100_overrun),
                ttr_overrun_min: overrun(g.sla.ttr_100_overrun),
                requester: directory.person_or_empty(ticket.caller_id),
                team: directory.contact_name(ticket.team_id),
                agent: directory.person_or_empty(ticket.agent_id),
                assignment_date: g.sla.assignment_date,
                resolution_date: g.sla.resolution_date,
                tto_deadline: g.sla.tto_100_deadline,
                ttr_deadline: g.sla.ttr_100_deadline,
                avg_response_min: g.response.avg_minutes(),
                avg_resolution_min: g.resolution.avg_minutes(),
            }
        })
        .collect()
}

fn overrun(seconds: Option<i64>) -> Metric {
    minutes(seconds).into()
}
