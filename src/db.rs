use crate::error::DeskError;
use crate::models::{ChangeDetail, Contact, ImportBundle, SlaDetail, Ticket};
use crate::report::period::ReportPeriod;
use crate::source::TicketSource;
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::env;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = ".deskstat.db";
pub const DB_PATH_ENV: &str = "DESKSTAT_DB_PATH";

/// Stored timestamp layout. Reads also accept a `T` separator and fractional seconds.
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = r#"
PRAGMA journal_mode=WAL;

CREATE TABLE IF NOT EXISTS contact (
    id              INTEGER PRIMARY KEY,
    name            TEXT,
    finalclass      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS person (
    id              INTEGER PRIMARY KEY,
    first_name      TEXT
);

CREATE TABLE IF NOT EXISTS ticket (
    id              INTEGER PRIMARY KEY,
    ref             TEXT NOT NULL DEFAULT '',
    title           TEXT NOT NULL DEFAULT '',
    finalclass      TEXT NOT NULL,
    start_date      TEXT NOT NULL,
    end_date        TEXT,
    last_update     TEXT,
    team_id         INTEGER,
    agent_id        INTEGER,
    caller_id       INTEGER
);

CREATE TABLE IF NOT EXISTS ticket_request (
    id                  INTEGER PRIMARY KEY,
    status              TEXT NOT NULL,
    tto_started         TEXT,
    tto_stopped         TEXT,
    ttr_stopped         TEXT,
    tto_75_passed       INTEGER NOT NULL DEFAULT 0,
    ttr_75_passed       INTEGER NOT NULL DEFAULT 0,
    tto_100_overrun     INTEGER,
    ttr_100_overrun     INTEGER,
    tto_100_deadline    TEXT,
    ttr_100_deadline    TEXT,
    assignment_date     TEXT,
    resolution_date     TEXT,
    approver_id         INTEGER
);

CREATE TABLE IF NOT EXISTS ticket_incident (
    id                  INTEGER PRIMARY KEY,
    status              TEXT NOT NULL,
    tto_started         TEXT,
    tto_stopped         TEXT,
    ttr_stopped         TEXT,
    tto_75_passed       INTEGER NOT NULL DEFAULT 0,
    ttr_75_passed       INTEGER NOT NULL DEFAULT 0,
    tto_100_overrun     INTEGER,
    ttr_100_overrun     INTEGER,
    tto_100_deadline    TEXT,
    ttr_100_deadline    TEXT,
    assignment_date     TEXT,
    resolution_date     TEXT,
    approver_id         INTEGER
);

CREATE TABLE IF NOT EXISTS "change" (
    id              INTEGER PRIMARY KEY,
    status          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config (
    key             TEXT PRIMARY KEY,
    value           TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ticket_start_date ON ticket(start_date);
CREATE INDEX IF NOT EXISTS idx_ticket_finalclass ON ticket(finalclass);
"#;

pub fn find_db(override_path: Option<&str>) -> Result<PathBuf, DeskError> {
    if let Ok(path) = env::var(DB_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Some(p) = override_path {
        return Ok(PathBuf::from(p));
    }

    let dir = env::current_dir().map_err(DeskError::Io)?;
    find_db_from(dir)
}

/// Walk up from `dir` looking for the database file.
pub fn find_db_from(mut dir: PathBuf) -> Result<PathBuf, DeskError> {
    loop {
        let candidate = dir.join(DB_FILE_NAME);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "database found");
            return Ok(candidate);
        }
        if !dir.pop() {
            return Err(DeskError::NoDatabase);
        }
    }
}

pub fn open_db(path: &Path) -> Result<Connection, DeskError> {
    if !path.exists() {
        return Err(DeskError::NoDatabase);
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_db(path: &Path) -> Result<Connection, DeskError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

pub fn get_schema_sql() -> &'static str {
    SCHEMA
}

// --- Timestamps ---

pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
}

fn format_timestamp(ts: Option<NaiveDateTime>) -> Option<String> {
    ts.map(|t| t.format(TS_FORMAT).to_string())
}

/// Optional timestamp column. Unparsable text is logged and read as missing.
fn opt_ts(row: &Row<'_>, idx: usize, table: &str, id: i64) -> rusqlite::Result<Option<NaiveDateTime>> {
    let Some(raw) = row.get::<_, Option<String>>(idx)? else {
        return Ok(None);
    };
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        tracing::warn!(table, id, column = idx, value = %raw, "unparsable timestamp, treated as missing");
    }
    Ok(parsed)
}

fn range_params(period: &ReportPeriod) -> (String, String) {
    (
        period.start_bound().format(TS_FORMAT).to_string(),
        period.end_bound().format(TS_FORMAT).to_string(),
    )
}

// --- Ticket source ---

#[derive(Clone, Copy)]
enum SlaTable {
    Request,
    Incident,
}

impl SlaTable {
    fn name(self) -> &'static str {
        match self {
            SlaTable::Request => "ticket_request",
            SlaTable::Incident => "ticket_incident",
        }
    }
}

/// SQLite-backed [`TicketSource`]. Ranged queries filter on `ticket.start_date`.
pub struct SqliteSource<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSource<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn fetch_sla(&self, table: SlaTable, period: &ReportPeriod) -> Result<Vec<SlaDetail>, DeskError> {
        let sql = format!(
            "SELECT d.id, d.status, d.tto_started, d.tto_stopped, d.ttr_stopped,
                    d.tto_75_passed, d.ttr_75_passed, d.tto_100_overrun, d.ttr_100_overrun,
                    d.tto_100_deadline, d.ttr_100_deadline, d.assignment_date, d.resolution_date,
                    d.approver_id
             FROM {} d JOIN ticket t ON t.id = d.id
             WHERE t.start_date >= ?1 AND t.start_date < ?2
             ORDER BY d.id",
            table.name()
        );
        let (start, end) = range_params(period);
        let name = table.name();
        let mut stmt = self.conn.prepare(&sql)?;
        let details = stmt
            .query_map(params![start, end], |row| {
                let id: i64 = row.get(0)?;
                Ok(SlaDetail {
                    id,
                    status: row.get(1)?,
                    tto_started: opt_ts(row, 2, name, id)?,
                    tto_stopped: opt_ts(row, 3, name, id)?,
                    ttr_stopped: opt_ts(row, 4, name, id)?,
                    tto_75_passed: row.get(5)?,
                    ttr_75_passed: row.get(6)?,
                    tto_100_overrun: row.get(7)?,
                    ttr_100_overrun: row.get(8)?,
                    tto_100_deadline: opt_ts(row, 9, name, id)?,
                    ttr_100_deadline: opt_ts(row, 10, name, id)?,
                    assignment_date: opt_ts(row, 11, name, id)?,
                    resolution_date: opt_ts(row, 12, name, id)?,
                    approver_id: row.get(13)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(details)
    }
}

impl TicketSource for SqliteSource<'_> {
    fn fetch_tickets(&self, period: &ReportPeriod) -> Result<Vec<Ticket>, DeskError> {
        let (start, end) = range_params(period);
        let mut stmt = self.conn.prepare(
            "SELECT id, ref, title, finalclass, start_date, end_date, last_update, team_id, agent_id, caller_id
             FROM ticket
             WHERE start_date >= ?1 AND start_date < ?2
             ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![start, end], |row| {
                let id: i64 = row.get(0)?;
                let raw_start: String = row.get(4)?;
                let Some(start_date) = parse_timestamp(&raw_start) else {
                    tracing::warn!(id, value = %raw_start, "ticket has unparsable start_date, skipped");
                    return Ok(None);
                };
                Ok(Some(Ticket {
                    id,
                    reference: row.get(1)?,
                    title: row.get(2)?,
                    finalclass: row.get(3)?,
                    start_date,
                    end_date: opt_ts(row, 5, "ticket", id)?,
                    last_update: opt_ts(row, 6, "ticket", id)?,
                    team_id: row.get(7)?,
                    agent_id: row.get(8)?,
                    caller_id: row.get(9)?,
                }))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows.into_iter().flatten().collect())
    }

    fn fetch_request_details(&self, period: &ReportPeriod) -> Result<Vec<SlaDetail>, DeskError> {
        self.fetch_sla(SlaTable::Request, period)
    }

    fn fetch_incident_details(&self, period: &ReportPeriod) -> Result<Vec<SlaDetail>, DeskError> {
        self.fetch_sla(SlaTable::Incident, period)
    }

    fn fetch_change_details(&self, period: &ReportPeriod) -> Result<Vec<ChangeDetail>, DeskError> {
        let (start, end) = range_params(period);
        let mut stmt = self.conn.prepare(
            r#"SELECT c.id, c.status FROM "change" c JOIN ticket t ON t.id = c.id
               WHERE t.start_date >= ?1 AND t.start_date < ?2
               ORDER BY c.id"#,
        )?;
        let changes = stmt
            .query_map(params![start, end], |row| {
                Ok(ChangeDetail {
                    id: row.get(0)?,
                    status: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(changes)
    }

    fn fetch_contacts(&self) -> Result<Vec<Contact>, DeskError> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.finalclass, p.first_name
             FROM contact c LEFT JOIN person p ON p.id = c.id
             ORDER BY c.id",
        )?;
        let contacts = stmt
            .query_map([], |row| {
                Ok(Contact {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    finalclass: row.get(2)?,
                    first_name: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contacts)
    }
}

// --- Import / export ---

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportCounts {
    pub imported: usize,
    pub skipped: usize,
}

fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool, DeskError> {
    let sql = format!(r#"SELECT 1 FROM "{}" WHERE id = ?1"#, table);
    let found = conn
        .query_row(&sql, params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Write every row of `bundle` inside one transaction. With `merge`, rows whose id
/// already exists are left untouched and counted as skipped; otherwise they are replaced.
pub fn import_bundle(conn: &Connection, bundle: &ImportBundle, merge: bool) -> Result<ImportCounts, DeskError> {
    let tx = conn.unchecked_transaction()?;
    let mut counts = ImportCounts::default();

    let mut keep = |table: &str, id: i64| -> Result<bool, DeskError> {
        if merge && row_exists(&tx, table, id)? {
            counts.skipped += 1;
            Ok(false)
        } else {
            counts.imported += 1;
            Ok(true)
        }
    };

    for contact in &bundle.contacts {
        if !keep("contact", contact.id)? {
            continue;
        }
        tx.execute(
            "INSERT OR REPLACE INTO contact (id, name, finalclass) VALUES (?1, ?2, ?3)",
            params![contact.id, contact.name, contact.finalclass],
        )?;
        if contact.is_person() || contact.first_name.is_some() {
            tx.execute(
                "INSERT OR REPLACE INTO person (id, first_name) VALUES (?1, ?2)",
                params![contact.id, contact.first_name],
            )?;
        }
    }

    for ticket in &bundle.tickets {
        if !keep("ticket", ticket.id)? {
            continue;
        }
        tx.execute(
            "INSERT OR REPLACE INTO ticket (id, ref, title, finalclass, start_date, end_date, last_update, team_id, agent_id, caller_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                ticket.id,
                ticket.reference,
                ticket.title,
                ticket.finalclass,
                ticket.start_date.format(TS_FORMAT).to_string(),
                format_timestamp(ticket.end_date),
                format_timestamp(ticket.last_update),
                ticket.team_id,
                ticket.agent_id,
                ticket.caller_id,
            ],
        )?;
    }

    for (table, details) in [
        (SlaTable::Request, &bundle.requests),
        (SlaTable::Incident, &bundle.incidents),
    ] {
        for d in details {
            if !keep(table.name(), d.id)? {
                continue;
            }
            let sql = format!(
                "INSERT OR REPLACE INTO {} (id, status, tto_started, tto_stopped, ttr_stopped,
                    tto_75_passed, ttr_75_passed, tto_100_overrun, ttr_100_overrun,
                    tto_100_deadline, ttr_100_deadline, assignment_date, resolution_date, approver_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                table.name()
            );
            tx.execute(
                &sql,
                params![
                    d.id,
                    d.status,
                    format_timestamp(d.tto_started),
                    format_timestamp(d.tto_stopped),
                    format_timestamp(d.ttr_stopped),
                    d.tto_75_passed,
                    d.ttr_75_passed,
                    d.tto_100_overrun,
                    d.ttr_100_overrun,
                    format_timestamp(d.tto_100_deadline),
                    format_timestamp(d.ttr_100_deadline),
                    format_timestamp(d.assignment_date),
                    format_timestamp(d.resolution_date),
                    d.approver_id,
                ],
            )?;
        }
    }

    for change in &bundle.changes {
        if !keep("change", change.id)? {
            continue;
        }
        tx.execute(
            r#"INSERT OR REPLACE INTO "change" (id, status) VALUES (?1, ?2)"#,
            params![change.id, change.status],
        )?;
    }

    tx.commit()?;
    tracing::info!(imported = counts.imported, skipped = counts.skipped, merge, "import finished");
    Ok(counts)
}

/// Every row whose ticket falls in `period`, plus all contacts.
pub fn export_bundle(conn: &Connection, period: &ReportPeriod) -> Result<ImportBundle, DeskError> {
    let source = SqliteSource::new(conn);
    Ok(ImportBundle {
        tickets: source.fetch_tickets(period)?,
        requests: source.fetch_request_details(period)?,
        incidents: source.fetch_incident_details(period)?,
        changes: source.fetch_change_details(period)?,
        contacts: source.fetch_contacts()?,
    })
}

// --- Config ---

pub fn config_get(conn: &Connection, key: &str) -> Result<Option<String>, DeskError> {
    let value = conn
        .query_row(
            "SELECT value FROM config WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

pub fn config_set(conn: &Connection, key: &str, value: &str) -> Result<(), DeskError> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub fn config_list(conn: &Connection) -> Result<Vec<(String, String)>, DeskError> {
    let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key")?;
    let rows: Vec<(String, String)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn config_reset(conn: &Connection) -> Result<(), DeskError> {
    conn.execute("DELETE FROM config", [])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures::{self, Fixture};
    use crate::source::fetch_snapshot;

    fn mem_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(get_schema_sql()).unwrap();
        conn
    }

    fn fixture_bundle() -> ImportBundle {
        let mut fx = Fixture::new();
        fx.request(1, "closed").tto_100_overrun = Some(600);
        fx.incident(2, "assigned").ttr_75_passed = true;
        fx.change(3, "closed");
        fx.request(4, "new");
        fx.ticket(4).start_date = fixtures::at(2024, 2, 3, 8, 0);

        let mut bundle = ImportBundle {
            tickets: fx.snapshot.tickets.clone(),
            contacts: fx.snapshot.contacts.clone(),
            ..ImportBundle::default()
        };
        for detail in &fx.snapshot.details {
            match detail {
                crate::models::TicketDetail::Request(d) => bundle.requests.push(d.clone()),
                crate::models::TicketDetail::Incident(d) => bundle.incidents.push(d.clone()),
                crate::models::TicketDetail::Change(c) => bundle.changes.push(c.clone()),
            }
        }
        bundle
    }

    #[test]
    fn timestamps_accept_both_separators() {
        let expected = fixtures::at(2024, 1, 10, 9, 30);
        assert_eq!(parse_timestamp("2024-01-10 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-10 09:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("10/01/2024"), None);
    }

    #[test]
    fn import_then_fetch_by_period() {
        let conn = mem_db();
        let bundle = fixture_bundle();
        let counts = import_bundle(&conn, &bundle, false).unwrap();
        assert_eq!(counts.imported, bundle.len());
        assert_eq!(counts.skipped, 0);

        let source = SqliteSource::new(&conn);
        let january = fixtures::january();
        let tickets = source.fetch_tickets(&january).unwrap();
        assert_eq!(tickets.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(tickets[0], bundle.tickets[0]);

        let requests = source.fetch_request_details(&january).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tto_100_overrun, Some(600));
        assert_eq!(requests[0].tto_stopped, bundle.requests[0].tto_stopped);

        let incidents = source.fetch_incident_details(&january).unwrap();
        assert!(incidents[0].ttr_75_passed);
        assert_eq!(source.fetch_change_details(&january).unwrap().len(), 1);

        let contacts = source.fetch_contacts().unwrap();
        let ann = contacts.iter().find(|c| c.id == fixtures::ANN).unwrap();
        assert_eq!(ann.first_name.as_deref(), Some("Ann"));
        let team = contacts.iter().find(|c| c.id == fixtures::DESK_TEAM).unwrap();
        assert_eq!(team.first_name, None);
    }

    #[test]
    fn period_end_is_exclusive() {
        let conn = mem_db();
        import_bundle(&conn, &fixture_bundle(), false).unwrap();
        let source = SqliteSource::new(&conn);
        let february = ReportPeriod::new(fixtures::date(2024, 2, 1), fixtures::date(2024, 2, 3));
        assert!(source.fetch_tickets(&february).unwrap().is_empty());
        let february = ReportPeriod::new(fixtures::date(2024, 2, 1), fixtures::date(2024, 2, 4));
        assert_eq!(source.fetch_tickets(&february).unwrap().len(), 1);
    }

    #[test]
    fn merge_skips_existing_rows() {
        let conn = mem_db();
        let mut bundle = fixture_bundle();
        import_bundle(&conn, &bundle, false).unwrap();

        bundle.changes[0].status = "rejected".to_string();
        let counts = import_bundle(&conn, &bundle, true).unwrap();
        assert_eq!(counts.imported, 0);
        assert_eq!(counts.skipped, bundle.len());

        let status: String = conn
            .query_row(r#"SELECT status FROM "change" WHERE id = 3"#, [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "closed");

        import_bundle(&conn, &bundle, false).unwrap();
        let status: String = conn
            .query_row(r#"SELECT status FROM "change" WHERE id = 3"#, [], |r| r.get(0))
            .unwrap();
        assert_eq!(status, "rejected");
    }

    #[test]
    fn bad_start_date_row_is_skipped() {
        let conn = mem_db();
        conn.execute(
            "INSERT INTO ticket (id, ref, title, finalclass, start_date) VALUES (9, 'R-9', 'x', 'Incident', '2024-01-xx')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ticket (id, ref, title, finalclass, start_date, end_date) VALUES (10, 'R-10', 'y', 'Incident', '2024-01-05 10:00:00', 'garbage')",
            [],
        )
        .unwrap();
        let tickets = SqliteSource::new(&conn)
            .fetch_tickets(&fixtures::january())
            .unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].id, 10);
        assert_eq!(tickets[0].end_date, None);
    }

    #[test]
    fn snapshot_from_sqlite_matches_fixture() {
        let conn = mem_db();
        let bundle = fixture_bundle();
        import_bundle(&conn, &bundle, false).unwrap();
        let snapshot = fetch_snapshot(&SqliteSource::new(&conn), &fixtures::january()).unwrap();
        assert_eq!(snapshot.tickets.len(), 3);
        assert_eq!(snapshot.details.len(), 3);
        assert_eq!(snapshot.contacts.len(), bundle.contacts.len());
    }

    #[test]
    fn export_returns_rows_in_period() {
        let conn = mem_db();
        import_bundle(&conn, &fixture_bundle(), false).unwrap();
        let exported = export_bundle(&conn, &fixtures::january()).unwrap();
        assert_eq!(exported.tickets.len(), 3);
        assert_eq!(exported.requests.len(), 1);
        assert_eq!(exported.incidents.len(), 1);
        assert_eq!(exported.changes.len(), 1);
    }

    #[test]
    fn config_round_trip_and_reset() {
        let conn = mem_db();
        assert_eq!(config_get(&conn, "labels.request").unwrap(), None);
        config_set(&conn, "labels.request", "Demande").unwrap();
        config_set(&conn, "labels.request", "Requête").unwrap();
        assert_eq!(config_get(&conn, "labels.request").unwrap().as_deref(), Some("Requête"));
        assert_eq!(config_list(&conn).unwrap().len(), 1);
        config_reset(&conn).unwrap();
        assert!(config_list(&conn).unwrap().is_empty());
    }

    #[test]
    fn init_creates_file_and_walk_up_finds_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DB_FILE_NAME);
        init_db(&path).unwrap();
        assert!(open_db(&path).is_ok());

        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_db_from(nested).unwrap(), path);
    }

    #[test]
    fn open_missing_db_is_no_database() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_db(&dir.path().join("missing.db")).unwrap_err();
        assert!(matches!(err, DeskError::NoDatabase));
    }
}
