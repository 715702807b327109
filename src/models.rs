use crate::report::rate::Metric;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Bundle timestamps: written in the store layout, read with either a space or a `T`
/// between date and time. An empty string reads as missing.
pub mod timestamp {
    use crate::db::{parse_timestamp, TS_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(TS_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use crate::db::{parse_timestamp, TS_FORMAT};
        use chrono::NaiveDateTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(ts: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error> {
            match ts {
                Some(t) => serializer.collect_str(&t.format(TS_FORMAT)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => parse_timestamp(&raw)
                    .map(Some)
                    .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw))),
            }
        }
    }
}

// --- Input records (supplied per query window, never mutated) ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    pub id: i64,
    #[serde(rename = "ref", default)]
    pub reference: String,
    #[serde(default)]
    pub title: String,
    pub finalclass: String,
    #[serde(with = "timestamp")]
    pub start_date: NaiveDateTime,
    #[serde(default, with = "timestamp::option")]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp::option")]
    pub last_update: Option<NaiveDateTime>,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub agent_id: Option<i64>,
    #[serde(default)]
    pub caller_id: Option<i64>,
}

impl Ticket {
    /// Problem tickets never enter any report.
    pub fn is_problem(&self) -> bool {
        self.finalclass == "Problem"
    }
}

/// Detail shape shared by service requests and incidents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlaDetail {
    pub id: i64,
    pub status: String,
    #[serde(with = "timestamp::option")]
    pub tto_started: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub tto_stopped: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub ttr_stopped: Option<NaiveDateTime>,
    pub tto_75_passed: bool,
    pub ttr_75_passed: bool,
    pub tto_100_overrun: Option<i64>,
    pub ttr_100_overrun: Option<i64>,
    #[serde(with = "timestamp::option")]
    pub tto_100_deadline: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub ttr_100_deadline: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub assignment_date: Option<NaiveDateTime>,
    #[serde(with = "timestamp::option")]
    pub resolution_date: Option<NaiveDateTime>,
    pub approver_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangeDetail {
    pub id: i64,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketType {
    Request,
    Incident,
    Change,
}

/// One subtype detail row, joined 1:1 to its ticket by id.
#[derive(Debug, Clone, PartialEq)]
pub enum TicketDetail {
    Request(SlaDetail),
    Incident(SlaDetail),
    Change(ChangeDetail),
}

impl TicketDetail {
    pub fn id(&self) -> i64 {
        match self {
            TicketDetail::Request(d) | TicketDetail::Incident(d) => d.id,
            TicketDetail::Change(c) => c.id,
        }
    }

    pub fn status(&self) -> &str {
        match self {
            TicketDetail::Request(d) | TicketDetail::Incident(d) => &d.status,
            TicketDetail::Change(c) => &c.status,
        }
    }

    pub fn ticket_type(&self) -> TicketType {
        match self {
            TicketDetail::Request(_) => TicketType::Request,
            TicketDetail::Incident(_) => TicketType::Incident,
            TicketDetail::Change(_) => TicketType::Change,
        }
    }

    pub fn sla(&self) -> Option<&SlaDetail> {
        match self {
            TicketDetail::Request(d) | TicketDetail::Incident(d) => Some(d),
            TicketDetail::Change(_) => None,
        }
    }

    /// Seconds from `tto_started` to `tto_stopped`. Changes have no response interval.
    pub fn response_time_sec(&self) -> Option<i64> {
        let sla = self.sla()?;
        seconds_between(sla.tto_started, sla.tto_stopped)
    }

    /// Requests and incidents measure `tto_stopped` → `ttr_stopped`; changes measure the
    /// ticket's own `start_date` → `end_date`.
    pub fn resolution_time_sec(&self, ticket: &Ticket) -> Option<i64> {
        match self {
            TicketDetail::Request(d) | TicketDetail::Incident(d) => {
                seconds_between(d.tto_stopped, d.ttr_stopped)
            }
            TicketDetail::Change(_) => seconds_between(Some(ticket.start_date), ticket.end_date),
        }
    }

    /// 75% SLA early-warning flag on either interval. Always false for changes.
    pub fn is_breached(&self) -> bool {
        self.sla()
            .is_some_and(|d| d.tto_75_passed || d.ttr_75_passed)
    }
}

fn seconds_between(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Option<i64> {
    Some(to?.signed_duration_since(from?).num_seconds())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub finalclass: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl Contact {
    pub fn is_team(&self) -> bool {
        self.finalclass == "Team"
    }

    pub fn is_person(&self) -> bool {
        self.finalclass == "Person"
    }

    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// `name + " " + first_name`, missing parts rendered as empty strings.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.name_or_empty(),
            self.first_name.as_deref().unwrap_or("")
        )
    }
}

/// Raw rows as exchanged by `import` / `export`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportBundle {
    pub tickets: Vec<Ticket>,
    pub requests: Vec<SlaDetail>,
    pub incidents: Vec<SlaDetail>,
    pub changes: Vec<ChangeDetail>,
    pub contacts: Vec<Contact>,
}

impl ImportBundle {
    pub fn extend(&mut self, other: ImportBundle) {
        self.tickets.extend(other.tickets);
        self.requests.extend(other.requests);
        self.incidents.extend(other.incidents);
        self.changes.extend(other.changes);
        self.contacts.extend(other.contacts);
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
            + self.requests.len()
            + self.incidents.len()
            + self.changes.len()
            + self.contacts.len()
    }
}

// --- Derived outputs (computed per report request, never persisted) ---

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TicketSummary {
    pub total: i64,
    pub request_total: i64,
    pub incident_total: i64,
    pub change_total: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubtypeSummary {
    NoActivity { ticket_type: String },
    Active(SummaryBundle),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryBundle {
    pub ticket_type: String,
    pub total: i64,
    pub resolved_total: i64,
    pub closed_total: i64,
    pub unresolved_total: i64,
    #[serde(flatten)]
    pub rates: SummaryRates,
    #[serde(skip)]
    pub slices: Vec<PieSlice>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum SummaryRates {
    /// Requests and incidents: closed is measured against resolved.
    Handling {
        resolved_pct: Metric,
        closed_pct: Metric,
        unresolved_pct: Metric,
    },
    /// Changes: resolved is measured against closed (execution success).
    Change {
        closed_pct: Metric,
        execution_success_pct: Metric,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: i64,
    pub share_pct: Metric,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricBundle {
    pub period: String,
    pub dimension_key: String,
    pub ticket_type: String,
    pub count: i64,
    pub unresolved_count: i64,
    pub breach_count: i64,
    pub resolution_rate_pct: Metric,
    pub timeliness_rate_pct: Metric,
    pub avg_response_min: Metric,
    pub avg_resolution_min: Metric,
    pub max_response_min: Metric,
    pub max_resolution_min: Metric,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TrendPoint {
    pub team: String,
    pub month: String,
    pub resolution_rate_pct: Metric,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnresolvedTicket {
    #[serde(rename = "ref")]
    pub reference: String,
    pub title: String,
    pub ticket_type: String,
    pub start_date: NaiveDateTime,
    pub status: String,
    pub requester: String,
    pub team: String,
    pub agent: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverdueGroup {
    pub status: String,
    pub ticket_count: i64,
    #[serde(rename = "ref")]
    pub reference: String,
    pub title: String,
    pub ticket_type: String,
    pub start_date: NaiveDateTime,
    pub last_update: Option<NaiveDateTime>,
    pub tto_overrun_min: Metric,
    pub ttr_overrun_min: Metric,
    pub requester: String,
    pub team: String,
    pub agent: String,
    pub assignment_date: Option<NaiveDateTime>,
    pub resolution_date: Option<NaiveDateTime>,
    pub tto_deadline: Option<NaiveDateTime>,
    pub ttr_deadline: Option<NaiveDateTime>,
    pub avg_response_min: Metric,
    pub avg_resolution_min: Metric,
}
