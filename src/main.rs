mod cli;
mod commands;
mod db;
mod error;
mod format;
mod logging;
mod models;
mod report;
mod settings;
mod source;

use clap::Parser;
use cli::{Cli, Commands, ConfigAction};
use error::handle_error;
use format::{Format, Section};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let fmt = Format::parse(&cli.format).unwrap_or_else(|| {
        eprintln!("ERROR: Invalid format '{}'. Valid: {}", cli.format, Format::CHOICES);
        std::process::exit(1);
    });

    let result = match cli.command {
        Commands::Init => commands::init::run(fmt, cli.db.as_deref()),
        Commands::Schema => commands::schema::run(fmt),
        command => {
            // All other commands need the database
            let db_path = match db::find_db(cli.db.as_deref()) {
                Ok(p) => p,
                Err(e) => handle_error(e, fmt.is_json()),
            };
            let conn = match db::open_db(&db_path) {
                Ok(c) => c,
                Err(e) => handle_error(e, fmt.is_json()),
            };

            run_command(command, &conn, fmt)
        }
    };

    if let Err(e) = result {
        handle_error(e, fmt.is_json());
    }
}

fn run_command(command: Commands, conn: &rusqlite::Connection, fmt: Format) -> Result<(), error::DeskError> {
    match command {
        Commands::Init | Commands::Schema => unreachable!("handled before opening the store"),

        Commands::Import { file, merge } => commands::import::run(conn, file, merge, fmt),

        Commands::Export { period, export_format } => commands::export::run(conn, &period, &export_format),

        Commands::Report { period } => commands::report::run(conn, &period, &Section::ALL, fmt),
        Commands::Summary { period } => commands::report::run(conn, &period, &[Section::Summary], fmt),
        Commands::Teams { period } => commands::report::run(conn, &period, &[Section::Teams], fmt),
        Commands::Agents { period } => commands::report::run(conn, &period, &[Section::Agents], fmt),
        Commands::Unresolved { period } => commands::report::run(conn, &period, &[Section::Unresolved], fmt),
        Commands::Overdue { period } => commands::report::run(conn, &period, &[Section::Overdue], fmt),
        Commands::Trend { period } => commands::report::run(conn, &period, &[Section::Trend], fmt),

        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::run_list(conn, fmt),
            ConfigAction::Get { key } => commands::config::run_get(conn, &key, fmt),
            ConfigAction::Set { key, value } => commands::config::run_set(conn, &key, &value, fmt),
            ConfigAction::Reset => commands::config::run_reset(conn, fmt),
        },
    }
}
