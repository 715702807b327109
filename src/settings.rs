use crate::db;
use crate::models::TicketType;
use rusqlite::Connection;

/// Per-store report settings. Anything not present in the `config` table keeps its
/// default.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub request_label: String,
    pub incident_label: String,
    pub change_label: String,
    pub resolved_statuses: Vec<String>,
    pub closed_status: String,
    pub new_status: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            request_label: "Service Request".to_string(),
            incident_label: "Incident".to_string(),
            change_label: "Change".to_string(),
            resolved_statuses: vec!["resolved".to_string(), "closed".to_string()],
            closed_status: "closed".to_string(),
            new_status: "new".to_string(),
        }
    }
}

impl ReportSettings {
    pub fn load(conn: &Connection) -> Self {
        let mut settings = Self::default();

        Self::load_key(conn, "labels.request", &mut settings.request_label);
        Self::load_key(conn, "labels.incident", &mut settings.incident_label);
        Self::load_key(conn, "labels.change", &mut settings.change_label);
        Self::load_key(conn, "status.closed", &mut settings.closed_status);
        Self::load_key(conn, "status.new", &mut settings.new_status);

        let mut resolved = String::new();
        Self::load_key(conn, "status.resolved", &mut resolved);
        let parsed = split_list(&resolved);
        if !parsed.is_empty() {
            settings.resolved_statuses = parsed;
        }

        tracing::debug!(?settings, "report settings loaded");
        settings
    }

    fn load_key(conn: &Connection, key: &str, target: &mut String) {
        match db::config_get(conn, key) {
            Ok(Some(val)) if !val.trim().is_empty() => *target = val.trim().to_string(),
            Ok(_) => {}
            Err(e) => tracing::warn!(key, error = %e, "could not read config key, using default"),
        }
    }

    pub fn defaults_map() -> Vec<(&'static str, String)> {
        let d = Self::default();
        vec![
            ("labels.request", d.request_label),
            ("labels.incident", d.incident_label),
            ("labels.change", d.change_label),
            ("status.resolved", d.resolved_statuses.join(",")),
            ("status.closed", d.closed_status),
            ("status.new", d.new_status),
        ]
    }

    pub fn is_known_key(key: &str) -> bool {
        Self::defaults_map().iter().any(|(k, _)| *k == key)
    }

    pub fn label(&self, ticket_type: TicketType) -> &str {
        match ticket_type {
            TicketType::Request => &self.request_label,
            TicketType::Incident => &self.incident_label,
            TicketType::Change => &self.change_label,
        }
    }

    pub fn is_new(&self, status: &str) -> bool {
        status == self.new_status
    }

    /// Resolved is inclusive of closed.
    pub fn is_resolved(&self, status: &str) -> bool {
        status == self.closed_status || self.resolved_statuses.iter().any(|s| s == status)
    }

    pub fn is_closed(&self, status: &str) -> bool {
        status == self.closed_status
    }

    /// Neither new nor resolved.
    pub fn is_unresolved(&self, status: &str) -> bool {
        !self.is_new(status) && !self.is_resolved(status)
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}
