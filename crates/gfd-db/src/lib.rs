//! # gfd-db
//!
//! libSQL persistence for Game for Devs.
//!
//! Holds tracks, admin users, game sessions, audit entries, and login
//! sessions in a local libSQL database. [`service::GameService`] wraps the
//! database handle and exposes every domain operation through `impl` blocks
//! in [`repos`]; mutations record an audit entry and optionally mirror it to
//! a JSONL file via [`trail::AuditTrailWriter`].

pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod trail;
pub mod updates;

mod test_support;

use error::DatabaseError;
use libsql::Builder;

/// Central database handle.
pub struct GameDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl GameDb {
    /// Open a local database at `path` (or `":memory:"`).
    ///
    /// Creates the parent directory for file paths and runs migrations.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| DatabaseError::Other(e.into()))?;
                }
            }
        }

        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Enable foreign keys (must be per-connection in SQLite)
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;

        let game_db = Self { db, conn };
        game_db.run_migrations().await?;
        tracing::debug!(path, "database opened");
        Ok(game_db)
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }
}
