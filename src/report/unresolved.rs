//! Tickets still open at report time.

use crate::models::UnresolvedTicket;
use crate::report::snapshot::{Directory, ReportRow};
use crate::settings::ReportSettings;

/// Every row whose status is neither new nor resolved, oldest first.
pub fn find(
    rows: &[ReportRow<'_>],
    directory: &Directory<'_>,
    settings: &ReportSettings,
) -> Vec<UnresolvedTicket> {
    let mut tickets: Vec<UnresolvedTicket> = rows
        .iter()
        .filter(|row| settings.is_unresolved(row.status()))
        .map(|row| UnresolvedTicket {
            reference: row.ticket.reference.clone(),
            title: row.ticket.title.clone(),
            ticket_type: settings.label(row.ticket_type()).to_string(),
            start_date: row.ticket.start_date,
            status: row.status().to_string(),
            requester: directory.person_or_empty(row.ticket.caller_id),
            team: directory.contact_name(row.ticket.team_id),
            agent: directory.person_or_empty(row.ticket.agent_id),
        })
        .collect();

    tickets.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.reference.cmp(&b.reference))
    });
    tickets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{self, at, Fixture};

    fn run(fx: &Fixture) -> Vec<UnresolvedTicket> {
        let settings = ReportSettings::default();
        let rows = fx.snapshot.rows(&fixtures::january(), &settings);
        find(&rows, &fx.snapshot.directory(), &settings)
    }

    #[test]
    fn keeps_only_open_statuses() {
        let mut fx = Fixture::new();
        fx.request(1, "new");
        fx.request(2, "closed");
        fx.incident(3, "resolved");
        fx.incident(4, "pending");
        fx.change(5, "planned");
        fx.change(6, "closed");

        let found = run(&fx);
        let refs: Vec<(&str, &str, &str)> = found
            .iter()
            .map(|t| (t.reference.as_str(), t.ticket_type.as_str(), t.status.as_str()))
            .collect();
        assert_eq!(
            refs,
            vec![("R-000004", "Incident", "pending"), ("R-000005", "Change", "planned")]
        );
    }

    #[test]
    fn resolves_names_and_tolerates_missing_contacts() {
        let mut fx = Fixture::new();
        fx.request(1, "assigned");
        fx.request(2, "assigned");
        let t = fx.ticket(2);
        t.team_id = None;
        t.agent_id = Some(9_999);
        t.caller_id = None;
        t.start_date = at(2024, 1, 2, 0, 0);

        let found = run(&fx);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].reference, "R-000002");
        assert_eq!(found[0].team, "");
        assert_eq!(found[0].agent, "");
        assert_eq!(found[0].requester, "");
        assert_eq!(found[1].team, "Service Desk");
        assert_eq!(found[1].agent, "Smith Ann");
        assert_eq!(found[1].requester, "Lee Bo");
    }

    #[test]
    fn problems_are_never_listed() {
        let mut fx = Fixture::new();
        fx.problem(1);
        assert!(run(&fx).is_empty());
    }
}
