//! Audit log repository.
//!
//! Append-only entries recording admin actions, logins, and page views.
//! Writing is best effort: a failed insert is logged and swallowed so the
//! audited operation itself never fails because of auditing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_jsonlines::WriteExt as _;

use gfd_core::entities::{AuditEvent, AuditLog};
use gfd_core::enums::{AuditActionType, AuditStatus};
use gfd_core::paging::{Page, PageRequest};
use gfd_core::stats::{ResourceActivity, UserAuditStats};

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_datetime, get_count, get_opt_string, like_contains, parse_datetime, parse_enum,
};
use crate::service::GameService;

const SELECT_COLS: &str = "id, username, action, action_type, resource_type, resource_id, \
     resource_name, details, timestamp, ip_address, user_agent, status, error_message";

fn row_to_audit(row: &libsql::Row) -> Result<AuditLog, DatabaseError> {
    Ok(AuditLog {
        id: row.get(0)?,
        username: row.get(1)?,
        action: row.get(2)?,
        action_type: parse_enum(&row.get::<String>(3)?)?,
        resource_type: row.get(4)?,
        resource_id: get_opt_string(row, 5)?,
        resource_name: get_opt_string(row, 6)?,
        details: get_opt_string(row, 7)?,
        timestamp: parse_datetime(&row.get::<String>(8)?)?,
        ip_address: get_opt_string(row, 9)?,
        user_agent: get_opt_string(row, 10)?,
        status: parse_enum(&row.get::<String>(11)?)?,
        error_message: get_opt_string(row, 12)?,
    })
}

/// Filter criteria for audit queries. All fields are optional and combine with AND.
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    /// Case-insensitive substring of the username.
    pub username: Option<String>,
    pub action_type: Option<AuditActionType>,
    /// Case-insensitive exact resource type.
    pub resource_type: Option<String>,
    pub status: Option<AuditStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AuditFilter {
    fn where_clause(&self) -> (String, Vec<libsql::Value>) {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref username) = self.username {
            params.push(like_contains(username).into());
            conditions.push(format!("lower(username) LIKE ?{} ESCAPE '\\'", params.len()));
        }
        if let Some(action_type) = self.action_type {
            params.push(action_type.as_str().into());
            conditions.push(format!("action_type = ?{}", params.len()));
        }
        if let Some(ref resource_type) = self.resource_type {
            params.push(resource_type.to_lowercase().into());
            conditions.push(format!("lower(resource_type) = ?{}", params.len()));
        }
        if let Some(status) = self.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(from) = self.from {
            params.push(fmt_datetime(from).into());
            conditions.push(format!("timestamp >= ?{}", params.len()));
        }
        if let Some(to) = self.to {
            params.push(fmt_datetime(to).into());
            conditions.push(format!("timestamp <= ?{}", params.len()));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

impl GameService {
    /// Record an audit entry, swallowing failures.
    ///
    /// Returns the stored entry, or `None` if it could not be written.
    pub async fn log_action(&self, event: AuditEvent) -> Option<AuditLog> {
        match self.insert_audit(&event).await {
            Ok(entry) => {
                if let Err(error) = self.trail().append(&entry) {
                    tracing::warn!(%error, id = entry.id, "audit mirror append failed");
                }
                Some(entry)
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    action = %event.action,
                    username = %event.username,
                    "failed to record audit entry"
                );
                None
            }
        }
    }

    /// Record a FAILED audit entry carrying `error_message`.
    pub async fn log_failed_action(
        &self,
        event: AuditEvent,
        error_message: impl Into<String>,
    ) -> Option<AuditLog> {
        self.log_action(event.failed(error_message)).await
    }

    async fn insert_audit(&self, event: &AuditEvent) -> Result<AuditLog, DatabaseError> {
        let now = Utc::now();
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "INSERT INTO audit_logs (username, action, action_type, resource_type, \
                     resource_id, resource_name, details, timestamp, ip_address, user_agent, \
                     status, error_message)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                     RETURNING {SELECT_COLS}"
                ),
                libsql::params![
                    event.username.as_str(),
                    event.action.as_str(),
                    event.action_type.as_str(),
                    event.resource_type.as_str(),
                    event.resource_id.as_deref(),
                    event.resource_name.as_deref(),
                    event.details.as_deref(),
                    fmt_datetime(now),
                    event.ip_address.as_deref(),
                    event.user_agent.as_deref(),
                    event.status.as_str(),
                    event.error_message.as_deref()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_audit(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no entry has this id.
    pub async fn get_audit_entry(&self, id: i64) -> Result<AuditLog, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM audit_logs WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Audit entry", id))?;
        row_to_audit(&row)
    }

    /// Filtered, paged audit entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(
        &self,
        filter: &AuditFilter,
        page: &PageRequest,
    ) -> Result<Page<AuditLog>, DatabaseError> {
        let (clause, params) = filter.where_clause();
        let total = self
            .query_count(
                &format!("SELECT COUNT(*) FROM audit_logs {clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;

        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM audit_logs {clause} \
                     ORDER BY timestamp DESC, id DESC LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(Page::new(entries, page, total))
    }

    /// All entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditLog>, DatabaseError> {
        let (clause, params) = filter.where_clause();
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM audit_logs {clause} ORDER BY timestamp DESC, id DESC"
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(entries)
    }

    /// Matching entries rendered as JSON Lines.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query or serialization fails.
    pub async fn export_audit(&self, filter: &AuditFilter) -> Result<Vec<u8>, DatabaseError> {
        let entries = self.list_audit(filter).await?;
        let mut buf = Vec::new();
        buf.write_json_lines(&entries)
            .map_err(|e| DatabaseError::Other(e.into()))?;
        Ok(buf)
    }

    /// The `limit` most recent entries.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn recent_audit(&self, limit: u32) -> Result<Vec<AuditLog>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM audit_logs ORDER BY timestamp DESC, id DESC LIMIT {limit}"
                ),
                (),
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_audit(&row)?);
        }
        Ok(entries)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn latest_audit(&self) -> Result<Option<AuditLog>, DatabaseError> {
        Ok(self.recent_audit(1).await?.into_iter().next())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_audit(&self) -> Result<u64, DatabaseError> {
        self.query_count("SELECT COUNT(*) FROM audit_logs", ()).await
    }

    /// Entries with `from <= timestamp <= to`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_audit_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        self.query_count(
            "SELECT COUNT(*) FROM audit_logs WHERE timestamp >= ?1 AND timestamp <= ?2",
            libsql::params![fmt_datetime(from), fmt_datetime(to)],
        )
        .await
    }

    /// Distinct non-system usernames with entries since `since`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn distinct_users_since(&self, since: DateTime<Utc>) -> Result<u64, DatabaseError> {
        self.query_count(
            "SELECT COUNT(DISTINCT username) FROM audit_logs \
             WHERE timestamp >= ?1 AND username != 'system'",
            [fmt_datetime(since)],
        )
        .await
    }

    /// Entry count per UTC day (`YYYY-MM-DD`), only days with entries.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn daily_audit_activity(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BTreeMap<String, u64>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT substr(timestamp, 1, 10) AS day, COUNT(*) FROM audit_logs \
                 WHERE timestamp >= ?1 AND timestamp <= ?2 GROUP BY day",
                libsql::params![fmt_datetime(from), fmt_datetime(to)],
            )
            .await?;
        let mut days = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            days.insert(row.get::<String>(0)?, get_count(&row, 1)?);
        }
        Ok(days)
    }

    /// Per-user action counts by action type, busiest users first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn action_stats_by_user(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserAuditStats>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT username, action_type, COUNT(*) FROM audit_logs \
                 WHERE timestamp >= ?1 AND timestamp <= ?2 \
                 GROUP BY username, action_type",
                libsql::params![fmt_datetime(from), fmt_datetime(to)],
            )
            .await?;
        let mut by_user: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            by_user
                .entry(row.get::<String>(0)?)
                .or_default()
                .insert(row.get::<String>(1)?, get_count(&row, 2)?);
        }
        let mut stats: Vec<UserAuditStats> = by_user
            .into_iter()
            .map(|(username, counts)| UserAuditStats::new(username, counts))
            .collect();
        stats.sort_by(|a, b| b.total_actions.cmp(&a.total_actions));
        Ok(stats)
    }

    /// Resources with the most CREATE/UPDATE/DELETE entries.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn most_modified_resources(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<ResourceActivity>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT resource_type, resource_name, COUNT(*) AS n FROM audit_logs \
                     WHERE timestamp >= ?1 AND timestamp <= ?2 \
                       AND action_type IN ('CREATE', 'UPDATE', 'DELETE') \
                     GROUP BY resource_type, resource_name \
                     ORDER BY n DESC LIMIT {limit}"
                ),
                libsql::params![fmt_datetime(from), fmt_datetime(to)],
            )
            .await?;
        let mut resources = Vec::new();
        while let Some(row) = rows.next().await? {
            resources.push(ResourceActivity {
                resource_type: row.get(0)?,
                resource_name: get_opt_string(&row, 1)?,
                modifications: get_count(&row, 2)?,
            });
        }
        Ok(resources)
    }
}
