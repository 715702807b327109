use crate::models::{MetricBundle, OverdueGroup, SubtypeSummary, SummaryRates, TrendPoint, UnresolvedTicket};
use crate::report::assemble::{Report, TablesOutput};
use crate::report::period::Granularity;
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Format {
    Compact,
    Json,
    Pretty,
}

impl Format {
    pub const CHOICES: &'static str = "compact, json, pretty";

    pub fn parse(s: &str) -> Option<Format> {
        match s {
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            "pretty" => Some(Format::Pretty),
            _ => None,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Format::Json)
    }
}

/// A renderable slice of a [`Report`]. Each maps onto one or more named tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Summary,
    Teams,
    Agents,
    Unresolved,
    Overdue,
    Trend,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Summary,
        Section::Teams,
        Section::Agents,
        Section::Unresolved,
        Section::Overdue,
        Section::Trend,
    ];

    fn tables(self) -> &'static [&'static str] {
        match self {
            Section::Summary => &[
                "ticket_summary",
                "request_summary",
                "incident_summary",
                "change_summary",
                "request_distribution",
                "incident_distribution",
                "change_distribution",
            ],
            Section::Teams => &["team_segments"],
            Section::Agents => &["agent_segments"],
            Section::Unresolved => &["unresolved_tickets"],
            Section::Overdue => &["overdue_by_status"],
            Section::Trend => &["service_request_trend"],
        }
    }

    fn title(self) -> &'static str {
        match self {
            Section::Summary => "SUMMARY",
            Section::Teams => "TEAM SEGMENTS",
            Section::Agents => "AGENT SEGMENTS",
            Section::Unresolved => "UNRESOLVED",
            Section::Overdue => "OVERDUE",
            Section::Trend => "SERVICE REQUEST TREND",
        }
    }
}

pub fn format_report(report: &Report, sections: &[Section], fmt: Format) -> Result<String, serde_json::Error> {
    match fmt {
        Format::Json => format_json(report, sections),
        Format::Compact | Format::Pretty => Ok(format_text(report, sections, fmt)),
    }
}

fn format_json(report: &Report, sections: &[Section]) -> Result<String, serde_json::Error> {
    let all = report.tables()?;
    let wanted: Vec<&str> = sections.iter().flat_map(|s| s.tables().iter().copied()).collect();
    let out = TablesOutput {
        period: all.period,
        tables: all
            .tables
            .into_iter()
            .filter(|t| wanted.contains(&t.name))
            .collect(),
    };
    serde_json::to_string(&out)
}

fn format_text(report: &Report, sections: &[Section], fmt: Format) -> String {
    let mut blocks = vec![format_period(report, fmt)];
    let with_titles = sections.len() > 1;
    for section in sections {
        let body = match (section, fmt) {
            (Section::Summary, Format::Pretty) => summary_pretty(report),
            (Section::Summary, _) => summary_compact(report),
            (Section::Teams, Format::Pretty) => segments_pretty(&report.team_segments, "Team"),
            (Section::Teams, _) => segments_compact(&report.team_segments, "TEAM"),
            (Section::Agents, Format::Pretty) => segments_pretty(&report.agent_segments, "Agent"),
            (Section::Agents, _) => segments_compact(&report.agent_segments, "AGENT"),
            (Section::Unresolved, Format::Pretty) => unresolved_pretty(&report.unresolved_tickets),
            (Section::Unresolved, _) => unresolved_compact(&report.unresolved_tickets),
            (Section::Overdue, Format::Pretty) => overdue_pretty(&report.overdue_by_status),
            (Section::Overdue, _) => overdue_compact(&report.overdue_by_status),
            (Section::Trend, Format::Pretty) => trend_pretty(&report.service_request_trend),
            (Section::Trend, _) => trend_compact(&report.service_request_trend),
        };
        let body = if body.is_empty() { "NONE".to_string() } else { body };
        if with_titles {
            blocks.push(format!("--- {} ---\n{}", section.title(), body));
        } else {
            blocks.push(body);
        }
    }
    blocks.join("\n\n")
}

fn granularity_name(g: Granularity) -> &'static str {
    match g {
        Granularity::WholeRange => "range",
        Granularity::Monthly => "month",
    }
}

fn format_period(report: &Report, fmt: Format) -> String {
    let p = &report.period;
    match fmt {
        Format::Pretty => format!(
            "Report {} ({} to {}, {} buckets)",
            p.label(),
            p.start,
            p.end,
            granularity_name(report.granularity)
        ),
        _ => format!(
            "PERIOD:{} START:{} END:{} GRANULARITY:{}",
            p.label(),
            p.start,
            p.end,
            granularity_name(report.granularity)
        ),
    }
}

fn ts(t: NaiveDateTime) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

fn opt_ts(t: Option<NaiveDateTime>) -> String {
    t.map_or_else(|| "-".to_string(), ts)
}

// --- Summary ---

fn summary_compact(report: &Report) -> String {
    let s = &report.ticket_summary;
    let mut lines = vec![format!(
        "TOTAL:{} REQUEST:{} INCIDENT:{} CHANGE:{}",
        s.total, s.request_total, s.incident_total, s.change_total
    )];
    for summary in report.summaries() {
        let SubtypeSummary::Active(b) = summary else {
            lines.push(format!("TYPE:\"{}\" NO_ACTIVITY", summary.ticket_type()));
            continue;
        };
        let mut line = format!(
            "TYPE:\"{}\" TOTAL:{} RESOLVED:{} CLOSED:{} UNRESOLVED:{}",
            b.ticket_type, b.total, b.resolved_total, b.closed_total, b.unresolved_total
        );
        match &b.rates {
            SummaryRates::Handling {
                resolved_pct,
                closed_pct,
                unresolved_pct,
            } => line.push_str(&format!(
                " RESOLVED_PCT:{} CLOSED_PCT:{} UNRESOLVED_PCT:{}",
                resolved_pct, closed_pct, unresolved_pct
            )),
            SummaryRates::Change {
                closed_pct,
                execution_success_pct,
            } => line.push_str(&format!(
                " CLOSED_PCT:{} EXECUTION_SUCCESS_PCT:{}",
                closed_pct, execution_success_pct
            )),
        }
        lines.push(line);
        let slices: Vec<String> = b
            .slices
            .iter()
            .map(|s| format!("{}={}({}%)", s.label, s.value, s.share_pct))
            .collect();
        lines.push(format!("SLICES: {}", slices.join(" ")));
    }
    for summary in report.summaries() {
        lines.push(format!("HEADLINE: {}", summary.headline()));
    }
    lines.join("\n")
}

fn summary_pretty(report: &Report) -> String {
    let s = &report.ticket_summary;
    let mut lines = vec![format!(
        "Tickets: {} total ({} requests, {} incidents, {} changes)",
        s.total, s.request_total, s.incident_total, s.change_total
    )];
    for summary in report.summaries() {
        lines.push(String::new());
        lines.push(summary.headline());
        if summary.slices().is_empty() {
            continue;
        }
        let rows = summary
            .slices()
            .iter()
            .map(|s| vec![s.label.clone(), s.value.to_string(), s.share_pct.to_string()])
            .collect();
        lines.push(render_table(&["Slice", "Count", "Share %"], rows));
    }
    lines.join("\n")
}

// --- Segments ---

fn segments_compact(bundles: &[MetricBundle], key: &str) -> String {
    bundles
        .iter()
        .map(|b| {
            format!(
                "PERIOD:{} {}:\"{}\" TYPE:\"{}\" COUNT:{} UNRESOLVED:{} BREACHED:{} RESOLUTION_PCT:{} TIMELINESS_PCT:{} AVG_RESPONSE_MIN:{} MAX_RESPONSE_MIN:{} AVG_RESOLUTION_MIN:{} MAX_RESOLUTION_MIN:{}",
                b.period,
                key,
                b.dimension_key,
                b.ticket_type,
                b.count,
                b.unresolved_count,
                b.breach_count,
                b.resolution_rate_pct,
                b.timeliness_rate_pct,
                b.avg_response_min,
                b.max_response_min,
                b.avg_resolution_min,
                b.max_resolution_min
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn segments_pretty(bundles: &[MetricBundle], dimension: &str) -> String {
    if bundles.is_empty() {
        return String::new();
    }
    let rows = bundles
        .iter()
        .map(|b| {
            vec![
                b.period.clone(),
                b.dimension_key.clone(),
                b.ticket_type.clone(),
                b.count.to_string(),
                b.unresolved_count.to_string(),
                b.breach_count.to_string(),
                b.resolution_rate_pct.to_string(),
                b.timeliness_rate_pct.to_string(),
                b.avg_response_min.to_string(),
                b.max_response_min.to_string(),
                b.avg_resolution_min.to_string(),
                b.max_resolution_min.to_string(),
            ]
        })
        .collect();
    render_table(
        &[
            "Period",
            dimension,
            "Type",
            "Count",
            "Open",
            "Breached",
            "Resolved %",
            "On time %",
            "Avg resp",
            "Max resp",
            "Avg resol",
            "Max resol",
        ],
        rows,
    )
}

// --- Unresolved ---

fn unresolved_compact(tickets: &[UnresolvedTicket]) -> String {
    tickets
        .iter()
        .map(|t| {
            format!(
                "REF:{} TYPE:\"{}\" STATUS:{} START:{} TEAM:\"{}\" AGENT:\"{}\" REQUESTER:\"{}\"\nTITLE: {}",
                t.reference,
                t.ticket_type,
                t.status,
                ts(t.start_date),
                t.team,
                t.agent,
                t.requester,
                t.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn unresolved_pretty(tickets: &[UnresolvedTicket]) -> String {
    if tickets.is_empty() {
        return String::new();
    }
    let rows = tickets
        .iter()
        .map(|t| {
            vec![
                t.reference.clone(),
                truncate(&t.title, 40),
                t.ticket_type.clone(),
                t.status.clone(),
                ts(t.start_date),
                t.team.clone(),
                t.agent.clone(),
                t.requester.clone(),
            ]
        })
        .collect();
    render_table(
        &["Ref", "Title", "Type", "Status", "Opened", "Team", "Agent", "Requester"],
        rows,
    )
}

// --- Overdue ---

fn overdue_compact(groups: &[OverdueGroup]) -> String {
    groups
        .iter()
        .map(|g| {
            format!(
                "STATUS:{} COUNT:{} REF:{} TYPE:\"{}\" START:{} LAST_UPDATE:{} TTO_OVERRUN_MIN:{} TTR_OVERRUN_MIN:{} AVG_RESPONSE_MIN:{} AVG_RESOLUTION_MIN:{} TTO_DEADLINE:{} TTR_DEADLINE:{} TEAM:\"{}\" AGENT:\"{}\" REQUESTER:\"{}\"\nTITLE: {}",
                g.status,
                g.ticket_count,
                g.reference,
                g.ticket_type,
                ts(g.start_date),
                opt_ts(g.last_update),
                g.tto_overrun_min,
                g.ttr_overrun_min,
                g.avg_response_min,
                g.avg_resolution_min,
                opt_ts(g.tto_deadline),
                opt_ts(g.ttr_deadline),
                g.team,
                g.agent,
                g.requester,
                g.title
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn overdue_pretty(groups: &[OverdueGroup]) -> String {
    if groups.is_empty() {
        return String::new();
    }
    let rows = groups
        .iter()
        .map(|g| {
            vec![
                g.status.clone(),
                g.ticket_count.to_string(),
                g.reference.clone(),
                truncate(&g.title, 30),
                g.ticket_type.clone(),
                g.tto_overrun_min.to_string(),
                g.ttr_overrun_min.to_string(),
                g.avg_response_min.to_string(),
                g.avg_resolution_min.to_string(),
                g.team.clone(),
                g.agent.clone(),
            ]
        })
        .collect();
    render_table(
        &[
            "Status", "Count", "Ref", "Title", "Type", "TTO over", "TTR over", "Avg resp", "Avg resol", "Team",
            "Agent",
        ],
        rows,
    )
}

// --- Trend ---

fn trend_compact(points: &[TrendPoint]) -> String {
    points
        .iter()
        .map(|p| format!("TEAM:\"{}\" MONTH:{} RESOLUTION_PCT:{}", p.team, p.month, p.resolution_rate_pct))
        .collect::<Vec<_>>()
        .join("\n")
}

fn trend_pretty(points: &[TrendPoint]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let rows = points
        .iter()
        .map(|p| vec![p.team.clone(), p.month.clone(), p.resolution_rate_pct.to_string()])
        .collect();
    render_table(&["Team", "Month", "Resolved %"], rows)
}

// --- Table layout ---

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| {
                let pad = w.saturating_sub(c.chars().count());
                format!(" {}{} ", c, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join("|")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![line(headers.iter().map(|h| (*h).to_string()).collect())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|"),
    );
    for row in rows {
        lines.push(line(row));
    }
    lines.join("\n")
}
