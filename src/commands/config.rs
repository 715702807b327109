use crate::db;
use crate::error::DeskError;
use crate::format::Format;
use crate::settings::ReportSettings;
use rusqlite::Connection;

/// Known keys with their effective values, then any other stored keys. The flag marks
/// values overridden in the store.
fn effective_entries(conn: &Connection) -> Result<Vec<(String, String, bool)>, DeskError> {
    let stored = db::config_list(conn)?;
    let mut entries: Vec<(String, String, bool)> = ReportSettings::defaults_map()
        .into_iter()
        .map(|(key, default_val)| match stored.iter().find(|(k, _)| k == key) {
            Some((_, v)) => (key.to_string(), v.clone(), true),
            None => (key.to_string(), default_val, false),
        })
        .collect();

    for (key, val) in &stored {
        if !ReportSettings::is_known_key(key) {
            entries.push((key.clone(), val.clone(), true));
        }
    }
    Ok(entries)
}

pub fn run_list(conn: &Connection, fmt: Format) -> Result<(), DeskError> {
    let entries = effective_entries(conn)?;

    match fmt {
        Format::Json => {
            let map: serde_json::Map<String, serde_json::Value> = entries
                .iter()
                .map(|(k, v, _)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            println!("{}", serde_json::to_string(&map)?);
        }
        _ => {
            for (key, val, is_custom) in &entries {
                let marker = if *is_custom { " *" } else { "" };
                println!("{}={}{}", key, val, marker);
            }
        }
    }

    Ok(())
}

fn lookup(conn: &Connection, key: &str) -> Result<String, DeskError> {
    if let Some(v) = db::config_get(conn, key)? {
        return Ok(v);
    }
    ReportSettings::defaults_map()
        .into_iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .ok_or_else(|| DeskError::UnknownKey(key.to_string()))
}

pub fn run_get(conn: &Connection, key: &str, fmt: Format) -> Result<(), DeskError> {
    let value = lookup(conn, key)?;

    match fmt {
        Format::Json => {
            let out = serde_json::json!({ "key": key, "value": value });
            println!("{}", out);
        }
        _ => {
            println!("{}={}", key, value);
        }
    }

    Ok(())
}

pub fn run_set(conn: &Connection, key: &str, value: &str, fmt: Format) -> Result<(), DeskError> {
    if !ReportSettings::is_known_key(key) {
        return Err(DeskError::UnknownKey(key.to_string()));
    }
    db::config_set(conn, key, value)?;
    tracing::debug!(key, value, "config updated");

    match fmt {
        Format::Json => {
            let out = serde_json::json!({ "action": "set", "key": key, "value": value });
            println!("{}", out);
        }
        _ => {
            println!("SET: {}={}", key, value);
        }
    }

    Ok(())
}

pub fn run_reset(conn: &Connection, fmt: Format) -> Result<(), DeskError> {
    db::config_reset(conn)?;

    match fmt {
        Format::Json => {
            let out = serde_json::json!({ "action": "reset" });
            println!("{}", out);
        }
        _ => {
            println!("CONFIG: Reset to defaults");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(db::get_schema_sql()).unwrap();
        conn
    }

    #[test]
    fn entries_mark_overrides() {
        let conn = conn();
        db::config_set(&conn, "labels.incident", "Incidente").unwrap();
        let entries = effective_entries(&conn).unwrap();
        assert_eq!(entries.len(), ReportSettings::defaults_map().len());
        let incident = entries.iter().find(|(k, _, _)| k == "labels.incident").unwrap();
        assert_eq!(incident, &("labels.incident".to_string(), "Incidente".to_string(), true));
        let closed = entries.iter().find(|(k, _, _)| k == "status.closed").unwrap();
        assert_eq!(closed, &("status.closed".to_string(), "closed".to_string(), false));
    }

    #[test]
    fn lookup_falls_back_to_default() {
        let conn = conn();
        assert_eq!(lookup(&conn, "status.resolved").unwrap(), "resolved,closed");
        assert!(matches!(lookup(&conn, "sla.target_hours"), Err(DeskError::UnknownKey(_))));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let conn = conn();
        let err = run_set(&conn, "labels.problem", "Problem", Format::Json).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_KEY");
        assert!(db::config_list(&conn).unwrap().is_empty());
    }
}
