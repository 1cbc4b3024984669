use clap::{Args, Subcommand};

use crate::cli::subcommands::{AuditCommands, StatsCommands, TrackCommands, UserCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP server.
    Serve(ServeArgs),
    /// Create or upgrade the database schema and exit.
    Migrate,
    /// Back-office accounts.
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Tracks.
    Track {
        #[command(subcommand)]
        action: TrackCommands,
    },
    /// Audit log.
    Audit {
        #[command(subcommand)]
        action: AuditCommands,
    },
    /// Gameplay and audit statistics.
    Stats {
        #[command(subcommand)]
        action: StatsCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    /// Interface to bind (overrides `server.host`).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides `server.port`).
    #[arg(long)]
    pub port: Option<u16>,
}
