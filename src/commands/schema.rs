use crate::db;
use crate::error::DeskError;
use crate::format::Format;

pub fn run(fmt: Format) -> Result<(), DeskError> {
    let schema = db::get_schema_sql();

    match fmt {
        Format::Json => {
            let out = serde_json::json!({ "schema": schema.trim() });
            println!("{}", out);
        }
        _ => {
            println!("{}", schema.trim());
        }
    }

    Ok(())
}
