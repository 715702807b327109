use super::resolve_period;
use crate::cli::PeriodArgs;
use crate::db;
use crate::error::DeskError;
use chrono::Local;
use rusqlite::Connection;

/// `jsonl` writes one single-family bundle per line so the output can be re-imported
/// line by line; `json` writes one pretty-printed bundle.
pub fn run(conn: &Connection, period: &PeriodArgs, export_format: &str) -> Result<(), DeskError> {
    let (period, _) = resolve_period(period, Local::now().date_naive())?;
    let bundle = db::export_bundle(conn, &period)?;
    tracing::debug!(rows = bundle.len(), period = %period.label(), "exporting");

    match export_format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }
        "jsonl" => {
            for contact in &bundle.contacts {
                println!("{}", serde_json::json!({ "contacts": [contact] }));
            }
            for ticket in &bundle.tickets {
                println!("{}", serde_json::json!({ "tickets": [ticket] }));
            }
            for request in &bundle.requests {
                println!("{}", serde_json::json!({ "requests": [request] }));
            }
            for incident in &bundle.incidents {
                println!("{}", serde_json::json!({ "incidents": [incident] }));
            }
            for change in &bundle.changes {
                println!("{}", serde_json::json!({ "changes": [change] }));
            }
        }
        other => {
            return Err(DeskError::InvalidValue {
                field: "export-format".to_string(),
                value: other.to_string(),
                valid: "jsonl, json".to_string(),
            });
        }
    }

    Ok(())
}
