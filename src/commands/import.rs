use crate::db;
use crate::error::DeskError;
use crate::format::Format;
use crate::models::ImportBundle;
use rusqlite::Connection;
use std::fs;
use std::io::{self, Read};

pub fn run(conn: &Connection, file: Option<String>, merge: bool, fmt: Format) -> Result<(), DeskError> {
    let input = match file {
        Some(path) => fs::read_to_string(&path)?,
        None => {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            buf
        }
    };

    let bundle = parse_bundle(&input)?;
    tracing::debug!(rows = bundle.len(), merge, "bundle parsed");
    let counts = db::import_bundle(conn, &bundle, merge)?;

    match fmt {
        Format::Json => {
            let out = serde_json::json!({
                "action": "import",
                "imported": counts.imported,
                "skipped": counts.skipped,
            });
            println!("{}", out);
        }
        _ => {
            println!("IMPORT: {} imported, {} skipped", counts.imported, counts.skipped);
        }
    }

    Ok(())
}

/// One JSON bundle document, or JSONL where every non-blank line is a partial bundle.
pub fn parse_bundle(input: &str) -> Result<ImportBundle, DeskError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(ImportBundle::default());
    }

    if let Ok(bundle) = serde_json::from_str::<ImportBundle>(input) {
        return Ok(bundle);
    }

    let mut bundle = ImportBundle::default();
    for line in input.lines().filter(|l| !l.trim().is_empty()) {
        bundle.extend(serde_json::from_str(line)?);
    }
    Ok(bundle)
}
