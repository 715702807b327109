//! Boundary to whatever supplies raw ticket rows for a reporting window.

use crate::error::DeskError;
use crate::models::{ChangeDetail, Contact, SlaDetail, Ticket, TicketDetail};
use crate::report::period::ReportPeriod;
use crate::report::snapshot::TicketSnapshot;

/// Row families keyed by ticket id / contact id. Ranged fetches filter on the ticket's
/// `start_date` with an inclusive start and exclusive end.
pub trait TicketSource {
    fn fetch_tickets(&self, period: &ReportPeriod) -> Result<Vec<Ticket>, DeskError>;
    fn fetch_request_details(&self, period: &ReportPeriod) -> Result<Vec<SlaDetail>, DeskError>;
    fn fetch_incident_details(&self, period: &ReportPeriod) -> Result<Vec<SlaDetail>, DeskError>;
    fn fetch_change_details(&self, period: &ReportPeriod) -> Result<Vec<ChangeDetail>, DeskError>;
    fn fetch_contacts(&self) -> Result<Vec<Contact>, DeskError>;
}

/// Load every row family for `period` into one immutable snapshot.
pub fn fetch_snapshot<S: TicketSource + ?Sized>(
    source: &S,
    period: &ReportPeriod,
) -> Result<TicketSnapshot, DeskError> {
    if period.is_degenerate() {
        tracing::info!(start = %period.start, end = %period.end, "degenerate period, nothing to fetch");
        return Ok(TicketSnapshot::default());
    }

    let tickets = source.fetch_tickets(period)?;
    let requests = source.fetch_request_details(period)?;
    let incidents = source.fetch_incident_details(period)?;
    let changes = source.fetch_change_details(period)?;
    let contacts = source.fetch_contacts()?;

    tracing::debug!(
        tickets = tickets.len(),
        requests = requests.len(),
        incidents = incidents.len(),
        changes = changes.len(),
        contacts = contacts.len(),
        "snapshot fetched"
    );

    let details = requests
        .into_iter()
        .map(TicketDetail::Request)
        .chain(incidents.into_iter().map(TicketDetail::Incident))
        .chain(changes.into_iter().map(TicketDetail::Change))
        .collect();

    Ok(TicketSnapshot::new(tickets, details, contacts))
}
