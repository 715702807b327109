use std::process;

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("Invalid value for {field}: '{value}'. Valid: {valid}")]
    InvalidValue {
        field: String,
        value: String,
        valid: String,
    },

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Unknown config key '{0}'")]
    UnknownKey(String),

    #[error("No .deskstat.db found. Run 'deskstat init' to create one.")]
    NoDatabase,

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeskError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DeskError::InvalidValue { .. } | DeskError::InvalidDate(_) | DeskError::UnknownKey(_) => 1,
            DeskError::NoDatabase => 1,
            DeskError::Db(_) | DeskError::Parse(_) | DeskError::Io(_) => 1,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DeskError::InvalidValue { .. } => "INVALID_VALUE",
            DeskError::InvalidDate(_) => "INVALID_DATE",
            DeskError::UnknownKey(_) => "UNKNOWN_KEY",
            DeskError::NoDatabase => "NO_DATABASE",
            DeskError::Db(_) => "DB_ERROR",
            DeskError::Parse(_) => "PARSE_ERROR",
            DeskError::Io(_) => "IO_ERROR",
        }
    }
}

pub fn handle_error(err: DeskError, json_mode: bool) -> ! {
    tracing::debug!(code = err.error_code(), "command failed");
    if json_mode {
        let err_json = serde_json::json!({
            "error": err.to_string(),
            "code": err.error_code(),
        });
        eprintln!("{}", err_json);
    } else {
        eprintln!("ERROR: {}", err);
    }
    process::exit(err.exit_code());
}

/// Exit with code 2 for empty result sets. `json_body` is printed to stdout when the
/// caller is in JSON mode; otherwise `msg` goes to stderr.
pub fn exit_empty(json_body: Option<&str>, msg: &str) -> ! {
    match json_body {
        Some(body) => println!("{}", body),
        None => eprintln!("{}", msg),
    }
    process::exit(2);
}
