use crate::db;
use crate::error::DeskError;
use crate::format::Format;
use std::env;
use std::path::PathBuf;

pub fn run(fmt: Format, db_override: Option<&str>) -> Result<(), DeskError> {
    let db_path = if let Some(p) = db_override {
        PathBuf::from(p)
    } else if let Ok(p) = env::var(db::DB_PATH_ENV) {
        PathBuf::from(p)
    } else {
        env::current_dir().map_err(DeskError::Io)?.join(db::DB_FILE_NAME)
    };

    // Schema statements are IF NOT EXISTS, so re-running init on an existing store is safe.
    let created = !db_path.exists();
    db::init_db(&db_path)?;
    tracing::info!(path = %db_path.display(), created, "store initialised");

    let path_str = db_path.to_string_lossy().to_string();
    match fmt {
        Format::Json => {
            let out = serde_json::json!({
                "action": "init",
                "path": path_str,
                "created": created,
            });
            println!("{}", out);
        }
        _ => {
            println!("INIT: {}", path_str);
        }
    }

    Ok(())
}
