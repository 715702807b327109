//! Handoff to the rendering layer: named, uniformly-shaped tables.

use crate::models::{
    MetricBundle, OverdueGroup, SubtypeSummary, TicketSummary, TrendPoint, UnresolvedTicket,
};
use crate::report::period::{Granularity, ReportPeriod};
use serde::Serialize;
use serde_json::{Map, Value};

pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NamedTable {
    pub name: &'static str,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodInfo {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub label: String,
    pub granularity: Granularity,
}

#[derive(Debug, Clone, Serialize)]
pub struct TablesOutput {
    pub period: PeriodInfo,
    pub tables: Vec<NamedTable>,
}

/// Everything one report request produces.
#[derive(Debug, Clone)]
pub struct Report {
    pub period: ReportPeriod,
    pub granularity: Granularity,
    pub ticket_summary: TicketSummary,
    pub request_summary: SubtypeSummary,
    pub incident_summary: SubtypeSummary,
    pub change_summary: SubtypeSummary,
    pub team_segments: Vec<MetricBundle>,
    pub agent_segments: Vec<MetricBundle>,
    pub unresolved_tickets: Vec<UnresolvedTicket>,
    pub overdue_by_status: Vec<OverdueGroup>,
    pub service_request_trend: Vec<TrendPoint>,
}

impl Report {
    pub fn period_info(&self) -> PeriodInfo {
        PeriodInfo {
            start_date: self.period.start,
            end_date: self.period.end,
            label: self.period.label(),
            granularity: self.granularity,
        }
    }

    /// Every output as a named table of column → value records.
    pub fn tables(&self) -> Result<TablesOutput, serde_json::Error> {
        let tables = vec![
            table("ticket_summary", std::slice::from_ref(&self.ticket_summary))?,
            table("request_summary", std::slice::from_ref(&self.request_summary))?,
            table("incident_summary", std::slice::from_ref(&self.incident_summary))?,
            table("change_summary", std::slice::from_ref(&self.change_summary))?,
            table("request_distribution", self.request_summary.slices())?,
            table("incident_distribution", self.incident_summary.slices())?,
            table("change_distribution", self.change_summary.slices())?,
            table("team_segments", &self.team_segments)?,
            table("agent_segments", &self.agent_segments)?,
            table("unresolved_tickets", &self.unresolved_tickets)?,
            table("overdue_by_status", &self.overdue_by_status)?,
            table("service_request_trend", &self.service_request_trend)?,
        ];
        Ok(TablesOutput {
            period: self.period_info(),
            tables,
        })
    }

    pub fn summaries(&self) -> [&SubtypeSummary; 3] {
        [&self.request_summary, &self.incident_summary, &self.change_summary]
    }
}

pub fn table<T: Serialize>(name: &'static str, items: &[T]) -> Result<NamedTable, serde_json::Error> {
    let rows = items
        .iter()
        .map(|item| {
            Ok(match serde_json::to_value(item)? {
                Value::Object(map) => map,
                other => {
                    let mut map = Map::new();
                    map.insert("value".to_string(), other);
                    map
                }
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;
    Ok(NamedTable { name, rows })
}
