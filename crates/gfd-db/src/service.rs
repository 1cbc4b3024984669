//! Service layer over the database.
//!
//! `GameService` wraps `GameDb` (raw database access) and `AuditTrailWriter`
//! (JSONL mirror). All domain operations are implemented as `impl GameService`
//! blocks in `crate::repos`.
//!
//! Mutations follow one protocol:
//! 1. Validate input with gfd-core rules
//! 2. Check business rules against current rows
//! 3. Execute SQL
//! 4. Record an audit entry (best effort, never fails the mutation)

use std::path::PathBuf;

use gfd_core::entities::AuditEvent;
use gfd_core::enums::AuditActionType;

use crate::GameDb;
use crate::error::DatabaseError;
use crate::helpers::get_count;
use crate::trail::AuditTrailWriter;

/// bcrypt work factor used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

pub struct GameService {
    db: GameDb,
    trail: AuditTrailWriter,
    bcrypt_cost: u32,
}

impl GameService {
    /// Open a local database and wrap it.
    ///
    /// `trail_dir` enables the JSONL audit mirror.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or the trail
    /// directory cannot be created.
    pub async fn new_local(
        db_path: &str,
        trail_dir: Option<PathBuf>,
    ) -> Result<Self, DatabaseError> {
        let db = GameDb::open_local(db_path).await?;
        let trail = match trail_dir {
            Some(dir) => AuditTrailWriter::new(dir)?,
            None => AuditTrailWriter::disabled(),
        };
        Ok(Self::from_db(db, trail))
    }

    #[must_use]
    pub const fn from_db(db: GameDb, trail: AuditTrailWriter) -> Self {
        Self {
            db,
            trail,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    #[must_use]
    pub const fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub const fn db(&self) -> &GameDb {
        &self.db
    }

    #[must_use]
    pub const fn trail(&self) -> &AuditTrailWriter {
        &self.trail
    }

    #[must_use]
    pub const fn bcrypt_cost(&self) -> u32 {
        self.bcrypt_cost
    }

    /// Run a single-value `COUNT(*)` query.
    pub(crate) async fn query_count(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<u64, DatabaseError> {
        let mut rows = self.db.conn().query(sql, params).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        get_count(&row, 0)
    }
}

/// Who performed an action and from where. Stamped onto audit entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    pub username: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ActionContext {
    /// Anonymous actor, recorded as `system`.
    #[must_use]
    pub fn system() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Start an audit event attributed to this actor.
    #[must_use]
    pub fn event(
        &self,
        action: impl Into<String>,
        action_type: AuditActionType,
        resource_type: &str,
    ) -> AuditEvent {
        AuditEvent::new(self.username.as_deref(), action, action_type, resource_type)
            .client(self.ip_address.clone(), self.user_agent.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfd_core::entities::SYSTEM_USERNAME;

    #[test]
    fn system_context_audits_as_system() {
        let event = ActionContext::system().event("x", AuditActionType::Read, "Page");
        assert_eq!(event.username, SYSTEM_USERNAME);
    }

    #[test]
    fn user_context_carries_client() {
        let ctx = ActionContext::user("admin")
            .with_client(Some("10.0.0.1".into()), Some("curl/8".into()));
        let event = ctx.event("Track created", AuditActionType::Create, "Track");
        assert_eq!(event.username, "admin");
        assert_eq!(event.ip_address.as_deref(), Some("10.0.0.1"));
        assert_eq!(event.user_agent.as_deref(), Some("curl/8"));
    }
}
