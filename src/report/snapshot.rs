//! Immutable per-request input and the joined row view the aggregators share.

use crate::models::{Contact, Ticket, TicketDetail, TicketType};
use crate::report::period::ReportPeriod;
use crate::settings::ReportSettings;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct TicketSnapshot {
    pub tickets: Vec<Ticket>,
    pub details: Vec<TicketDetail>,
    pub contacts: Vec<Contact>,
}

impl TicketSnapshot {
    pub fn new(tickets: Vec<Ticket>, details: Vec<TicketDetail>, contacts: Vec<Contact>) -> Self {
        Self {
            tickets,
            details,
            contacts,
        }
    }

    pub fn directory(&self) -> Directory<'_> {
        Directory {
            contacts: self.contacts.iter().map(|c| (c.id, c)).collect(),
        }
    }

    /// Detail rows joined to their ticket, restricted to `period`, with Problem tickets,
    /// orphan details and "new" records removed. Ordered by ticket id.
    pub fn rows(&self, period: &ReportPeriod, settings: &ReportSettings) -> Vec<ReportRow<'_>> {
        if period.is_degenerate() {
            return Vec::new();
        }
        let tickets: HashMap<i64, &Ticket> = self.tickets.iter().map(|t| (t.id, t)).collect();

        let mut rows: Vec<ReportRow<'_>> = self
            .details
            .iter()
            .filter_map(|detail| {
                let Some(ticket) = tickets.get(&detail.id()) else {
                    tracing::warn!(id = detail.id(), "detail row without ticket header, skipped");
                    return None;
                };
                Some(ReportRow { ticket, detail })
            })
            .filter(|row| !row.ticket.is_problem())
            .filter(|row| period.contains(row.ticket.start_date))
            .filter(|row| !settings.is_new(row.status()))
            .collect();

        rows.sort_by_key(|r| (r.ticket.id, r.ticket_type()));
        rows
    }
}

/// A subtype detail joined to its ticket header.
#[derive(Debug, Clone, Copy)]
pub struct ReportRow<'a> {
    pub ticket: &'a Ticket,
    pub detail: &'a TicketDetail,
}

impl ReportRow<'_> {
    pub fn ticket_type(&self) -> TicketType {
        self.detail.ticket_type()
    }

    pub fn status(&self) -> &str {
        self.detail.status()
    }

    pub fn response_time_sec(&self) -> Option<i64> {
        self.detail.response_time_sec()
    }

    pub fn resolution_time_sec(&self) -> Option<i64> {
        self.detail.resolution_time_sec(self.ticket)
    }

    pub fn is_breached(&self) -> bool {
        self.detail.is_breached()
    }
}

/// Contact lookups. A missing or mismatched join target is never an error.
pub struct Directory<'a> {
    contacts: HashMap<i64, &'a Contact>,
}

impl Directory<'_> {
    fn get(&self, id: Option<i64>) -> Option<&Contact> {
        id.and_then(|id| self.contacts.get(&id).copied())
    }

    /// Team name, only when the contact really is a Team.
    pub fn team(&self, id: Option<i64>) -> Option<String> {
        self.get(id)
            .filter(|c| c.is_team())
            .map(|c| c.name_or_empty().to_string())
    }

    /// Person display name, only when the contact really is a Person.
    pub fn person(&self, id: Option<i64>) -> Option<String> {
        self.get(id).filter(|c| c.is_person()).map(Contact::display_name)
    }

    /// Name of any contact, empty when missing.
    pub fn contact_name(&self, id: Option<i64>) -> String {
        self.get(id).map(|c| c.name_or_empty().to_string()).unwrap_or_default()
    }

    /// Person display name, empty when missing.
    pub fn person_or_empty(&self, id: Option<i64>) -> String {
        self.person(id).unwrap_or_default()
    }
}
