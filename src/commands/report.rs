use super::load_report;
use crate::cli::PeriodArgs;
use crate::error::{exit_empty, DeskError};
use crate::format::{self, Format, Section};
use crate::report::assemble::Report;
use rusqlite::Connection;

/// Render the requested sections. `report` and `summary` always print; a single list
/// section with no rows exits with code 2.
pub fn run(conn: &Connection, period: &PeriodArgs, sections: &[Section], fmt: Format) -> Result<(), DeskError> {
    let report = load_report(conn, period)?;

    if let [section] = sections {
        if section_is_empty(&report, *section) {
            // JSON keeps the usual {period, tables} shape, with empty rows.
            let body = if fmt.is_json() {
                Some(format::format_report(&report, sections, fmt)?)
            } else {
                None
            };
            exit_empty(body.as_deref(), &empty_message(&report, *section));
        }
    }

    println!("{}", format::format_report(&report, sections, fmt)?);
    Ok(())
}

fn section_is_empty(report: &Report, section: Section) -> bool {
    match section {
        Section::Summary => false,
        Section::Teams => report.team_segments.is_empty(),
        Section::Agents => report.agent_segments.is_empty(),
        Section::Unresolved => report.unresolved_tickets.is_empty(),
        Section::Overdue => report.overdue_by_status.is_empty(),
        Section::Trend => report.service_request_trend.is_empty(),
    }
}

fn empty_message(report: &Report, section: Section) -> String {
    let what = match section {
        Section::Summary => "tickets",
        Section::Teams => "team segments",
        Section::Agents => "agent segments",
        Section::Unresolved => "unresolved tickets",
        Section::Overdue => "overdue tickets",
        Section::Trend => "service request trend points (trend needs monthly granularity)",
    };
    format!("No {} for {}", what, report.period.label())
}
