//! Hand-built snapshots shared by the report tests.

use crate::models::{ChangeDetail, Contact, SlaDetail, Ticket, TicketDetail};
use crate::report::period::ReportPeriod;
use crate::report::snapshot::TicketSnapshot;
use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const DESK_TEAM: i64 = 100;
pub const NETWORK_TEAM: i64 = 101;
pub const ANN: i64 = 200;
pub const BO: i64 = 201;
pub const ACME_ORG: i64 = 300;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

pub fn january() -> ReportPeriod {
    ReportPeriod::new(date(2024, 1, 1), date(2024, 2, 1))
}

pub fn first_quarter() -> ReportPeriod {
    ReportPeriod::new(date(2024, 1, 1), date(2024, 4, 1))
}

fn contact(id: i64, name: &str, class: &str, first_name: Option<&str>) -> Contact {
    Contact {
        id,
        name: Some(name.to_string()),
        finalclass: class.to_string(),
        first_name: first_name.map(String::from),
    }
}

pub struct Fixture {
    pub snapshot: TicketSnapshot,
}

impl Fixture {
    /// Two teams, two agents and one organisation; no tickets.
    pub fn new() -> Self {
        let contacts = vec![
            contact(DESK_TEAM, "Service Desk", "Team", None),
            contact(NETWORK_TEAM, "Network", "Team", None),
            contact(ANN, "Smith", "Person", Some("Ann")),
            contact(BO, "Lee", "Person", Some("Bo")),
            contact(ACME_ORG, "Acme", "Organization", None),
        ];
        Self {
            snapshot: TicketSnapshot::new(Vec::new(), Vec::new(), contacts),
        }
    }

    fn push_ticket(&mut self, id: i64, class: &str) {
        let start = at(2024, 1, 10, 9, 0);
        self.snapshot.tickets.push(Ticket {
            id,
            reference: format!("R-{:06}", id),
            title: format!("Ticket {}", id),
            finalclass: class.to_string(),
            start_date: start,
            end_date: Some(start + Duration::hours(4)),
            last_update: Some(start + Duration::hours(5)),
            team_id: Some(DESK_TEAM),
            agent_id: Some(ANN),
            caller_id: Some(BO),
        });
    }

    fn sla(id: i64, status: &str) -> SlaDetail {
        let start = at(2024, 1, 10, 9, 0);
        SlaDetail {
            id,
            status: status.to_string(),
            tto_started: Some(start),
            tto_stopped: Some(start + Duration::minutes(30)),
            ttr_stopped: Some(start + Duration::minutes(150)),
            ..SlaDetail::default()
        }
    }

    fn last_sla(&mut self) -> &mut SlaDetail {
        match self.snapshot.details.last_mut() {
            Some(TicketDetail::Request(d) | TicketDetail::Incident(d)) => d,
            _ => unreachable!("last detail is not an SLA detail"),
        }
    }

    pub fn request(&mut self, id: i64, status: &str) -> &mut SlaDetail {
        self.push_ticket(id, "UserRequest");
        self.snapshot
            .details
            .push(TicketDetail::Request(Self::sla(id, status)));
        self.last_sla()
    }

    pub fn incident(&mut self, id: i64, status: &str) -> &mut SlaDetail {
        self.push_ticket(id, "Incident");
        self.snapshot
            .details
            .push(TicketDetail::Incident(Self::sla(id, status)));
        self.last_sla()
    }

    pub fn change(&mut self, id: i64, status: &str) {
        self.push_ticket(id, "NormalChange");
        self.snapshot.details.push(TicketDetail::Change(ChangeDetail {
            id,
            status: status.to_string(),
        }));
    }

    /// A Problem ticket carrying a stray incident detail; must never be reported.
    pub fn problem(&mut self, id: i64) {
        self.push_ticket(id, "Problem");
        self.snapshot
            .details
            .push(TicketDetail::Incident(Self::sla(id, "assigned")));
    }

    pub fn ticket(&mut self, id: i64) -> &mut Ticket {
        self.snapshot
            .tickets
            .iter_mut()
            .find(|t| t.id == id)
            .unwrap()
    }
}
