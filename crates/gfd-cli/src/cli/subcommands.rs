use clap::Subcommand;

#[derive(Clone, Debug, Subcommand)]
pub enum UserCommands {
    /// Create an account.
    Create {
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        full_name: Option<String>,

        /// admin or super-admin
        #[arg(long, default_value = "admin")]
        role: String,
    },
    /// List accounts, newest first.
    List {
        /// Match username, email or full name.
        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long)]
        size: Option<u32>,
    },
    /// Set a new password for an account.
    Passwd {
        username: String,

        #[arg(long)]
        password: String,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum TrackCommands {
    /// List all tracks, including inactive ones.
    List,
    /// Export tracks as a JSON document.
    Export {
        /// Export a single track.
        #[arg(long)]
        id: Option<i64>,

        /// Include inactive tracks when exporting all.
        #[arg(long)]
        all: bool,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Import tracks from an export document (one track or an array).
    Import {
        file: String,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum AuditCommands {
    /// Show the most recent entries.
    Recent {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Write matching entries as JSON Lines.
    Export {
        #[arg(long)]
        username: Option<String>,

        /// Action type, e.g. create or login.
        #[arg(long)]
        action: Option<String>,

        /// Resource type, e.g. TRACK.
        #[arg(long)]
        entity: Option<String>,

        /// Lower bound, `YYYY-MM-DD` or RFC 3339.
        #[arg(long)]
        from: Option<String>,

        /// Upper bound, `YYYY-MM-DD` or RFC 3339.
        #[arg(long)]
        to: Option<String>,

        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Debug, Subcommand)]
pub enum StatsCommands {
    /// Full system report.
    Report,
    /// Per-day session counts.
    Daily {
        #[arg(long, default_value_t = 30)]
        days: u32,

        /// Emit CSV instead of the selected output format.
        #[arg(long)]
        csv: bool,
    },
}
