use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "deskstat", about = "Service-desk operational metrics report CLI", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: compact|json|pretty
    #[arg(short, long, default_value = "compact", global = true)]
    pub format: String,

    /// Override database path (skips walk-up search)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Reporting window shared by every report command.
#[derive(Args, Debug, Clone, Default)]
pub struct PeriodArgs {
    /// First day of the period, inclusive (YYYY-MM-DD). Default: first day of last month
    #[arg(long)]
    pub start: Option<String>,

    /// Day after the period, exclusive (YYYY-MM-DD). Default: first day of this month
    #[arg(long)]
    pub end: Option<String>,

    /// Segment buckets: auto|range|month
    #[arg(short, long, default_value = "auto")]
    pub granularity: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new .deskstat.db database
    Init,

    /// Import ticket rows from a JSON or JSONL bundle
    Import {
        /// Input file path (or stdin)
        #[arg(long)]
        file: Option<String>,

        /// Skip existing IDs instead of replacing them
        #[arg(long)]
        merge: bool,
    },

    /// Export the ticket rows of a period
    Export {
        #[command(flatten)]
        period: PeriodArgs,

        /// Export format: jsonl|json
        #[arg(long, default_value = "jsonl")]
        export_format: String,
    },

    /// Full report: summaries, segments, unresolved and overdue tickets
    Report {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Ticket totals and per-type resolution summaries
    Summary {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Metrics per team and ticket type
    Teams {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Metrics per agent and ticket type
    Agents {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Tickets that are neither new nor resolved
    Unresolved {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// SLA-breached tickets, one row per status
    Overdue {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Monthly service request resolution rate per team
    Trend {
        #[command(flatten)]
        period: PeriodArgs,
    },

    /// Manage per-store configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Dump the database schema
    Schema,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// List all settings
    List,
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// Restore all defaults
    Reset,
}
