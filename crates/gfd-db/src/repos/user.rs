//! Admin user repository.
//!
//! Users are soft deleted. The last active ADMIN can be neither deleted,
//! deactivated, nor demoted, so the back office always has an administrator.

use chrono::Utc;
use serde::Deserialize;

use gfd_auth::AuthError;
use gfd_auth::password::{hash_password, verify_password};
use gfd_config::BootstrapAdminConfig;
use gfd_core::entities::{User, validate_email, validate_password, validate_username};
use gfd_core::enums::{AuditActionType, Role};
use gfd_core::paging::{Page, PageRequest};
use gfd_core::stats::UserStats;

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_datetime, get_bool, get_count, get_opt_string, like_contains, parse_datetime, parse_enum,
    parse_optional_datetime,
};
use crate::service::{ActionContext, GameService};
use crate::updates::user::UserUpdate;

const SELECT_COLS: &str = "id, username, password_hash, email, full_name, role, is_active, \
     created_at, last_login, created_by";

const SORTABLE: &[(&str, &str)] = &[
    ("id", "id"),
    ("username", "username"),
    ("email", "email"),
    ("fullName", "full_name"),
    ("full_name", "full_name"),
    ("role", "role"),
    ("createdAt", "created_at"),
    ("created_at", "created_at"),
    ("lastLogin", "last_login"),
    ("last_login", "last_login"),
];

const RESOURCE: &str = "USER";

/// `WHERE` condition on a `users` row: removing its admin rights still leaves
/// an active ADMIN. Checked inside the `UPDATE` so concurrent changes cannot both pass.
const LEAVES_ANOTHER_ADMIN: &str = "(is_active = 0 OR role <> 'ADMIN' OR EXISTS \
     (SELECT 1 FROM users AS other \
      WHERE other.is_active = 1 AND other.role = 'ADMIN' AND other.id <> users.id))";

fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        email: row.get(3)?,
        full_name: row.get(4)?,
        role: parse_enum(&row.get::<String>(5)?)?,
        is_active: get_bool(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        last_login: parse_optional_datetime(get_opt_string(row, 8)?.as_deref())?,
        created_by: get_opt_string(row, 9)?,
    })
}

fn sort_column(sort_by: &str) -> &'static str {
    SORTABLE
        .iter()
        .find(|(key, _)| *key == sort_by)
        .map_or("id", |(_, column)| *column)
}

/// Input for a new admin account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Falls back to the username when blank.
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl GameService {
    /// Create an admin account with a bcrypt-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for bad fields and `Conflict` when
    /// the username or email is taken.
    pub async fn create_user(
        &self,
        input: NewUser,
        ctx: &ActionContext,
    ) -> Result<User, DatabaseError> {
        let username = validate_username(&input.username)?;
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;
        let full_name = input
            .full_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone());

        if !self.is_username_available(&username, None).await? {
            return Err(DatabaseError::Conflict("Username already exists".into()));
        }
        if !self.is_email_available(&email, None).await? {
            return Err(DatabaseError::Conflict("Email already registered".into()));
        }

        let password_hash = hash_password(&input.password, self.bcrypt_cost()).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "INSERT INTO users (username, password_hash, email, full_name, role, \
                     is_active, created_at, created_by)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     RETURNING {SELECT_COLS}"
                ),
                libsql::params![
                    username.as_str(),
                    password_hash,
                    email.as_str(),
                    full_name.as_str(),
                    input.role.as_str(),
                    i64::from(input.is_active),
                    fmt_datetime(Utc::now()),
                    ctx.username.as_deref()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let user = row_to_user(&row)?;

        tracing::info!(id = user.id, username = %user.username, role = %user.role, "user created");
        self.log_action(
            ctx.event("User created", AuditActionType::Create, RESOURCE)
                .resource(user.id, &user.username),
        )
        .await;
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no user has this id.
    pub async fn get_user(&self, id: i64) -> Result<User, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM users WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", id))?;
        row_to_user(&row)
    }

    /// Exact username lookup, active or not.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM users WHERE username = ?1"),
                [username.trim()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Apply a partial update. A blank password leaves the hash unchanged.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound`, `Validation` for bad fields, or
    /// `Conflict` for taken names or when the last active admin would be lost.
    pub async fn update_user(
        &self,
        id: i64,
        update: UserUpdate,
        ctx: &ActionContext,
    ) -> Result<User, DatabaseError> {
        let current = self.get_user(id).await?;

        let username = update
            .username
            .as_deref()
            .map(validate_username)
            .transpose()?;
        let email = update.email.as_deref().map(validate_email).transpose()?;
        if let Some(password) = update.new_password() {
            validate_password(password)?;
        }
        if let Some(ref username) = username {
            if !self.is_username_available(username, Some(id)).await? {
                return Err(DatabaseError::Conflict("Username already exists".into()));
            }
        }
        if let Some(ref email) = email {
            if !self.is_email_available(email, Some(id)).await? {
                return Err(DatabaseError::Conflict("Email already registered".into()));
            }
        }

        let deactivates = update.is_active == Some(false);
        let demotes = update.role.is_some_and(|role| role != Role::Admin);

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(username) = username {
            params.push(username.into());
            sets.push(format!("username = ?{}", params.len()));
        }
        if let Some(email) = email {
            params.push(email.into());
            sets.push(format!("email = ?{}", params.len()));
        }
        if let Some(password) = update.new_password() {
            params.push(hash_password(password, self.bcrypt_cost()).await?.into());
            sets.push(format!("password_hash = ?{}", params.len()));
        }
        if let Some(full_name) = update
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            params.push(full_name.into());
            sets.push(format!("full_name = ?{}", params.len()));
        }
        if let Some(role) = update.role {
            params.push(role.as_str().into());
            sets.push(format!("role = ?{}", params.len()));
        }
        if let Some(active) = update.is_active {
            params.push(i64::from(active).into());
            sets.push(format!("is_active = ?{}", params.len()));
        }

        if sets.is_empty() {
            return Ok(current);
        }

        params.push(id.into());
        let mut sql = format!(
            "UPDATE users SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );
        if deactivates || demotes {
            sql.push_str(" AND ");
            sql.push_str(LEAVES_ANOTHER_ADMIN);
        }
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            if deactivates || demotes {
                return Err(DatabaseError::Conflict(
                    "Cannot remove the last active administrator".into(),
                ));
            }
            return Err(DatabaseError::not_found("User", id));
        }
        if deactivates {
            self.delete_user_sessions(id).await?;
        }

        let updated = self.get_user(id).await?;
        let details = serde_json::to_string(&update).map_err(|e| DatabaseError::Other(e.into()))?;
        self.log_action(
            ctx.event("User updated", AuditActionType::Update, RESOURCE)
                .resource(updated.id, &updated.username)
                .details(details),
        )
        .await;
        Ok(updated)
    }

    /// Soft delete and revoke the user's login sessions.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound`, or `Conflict` when deleting yourself
    /// or the last active admin.
    pub async fn delete_user(&self, id: i64, ctx: &ActionContext) -> Result<(), DatabaseError> {
        let user = self.get_user(id).await?;
        if ctx.username.as_deref() == Some(user.username.as_str()) {
            return Err(DatabaseError::Conflict(
                "You cannot delete your own account".into(),
            ));
        }
        if !user.is_active {
            return Ok(());
        }

        let changed = self
            .db()
            .conn()
            .execute(
                &format!(
                    "UPDATE users SET is_active = 0 \
                     WHERE id = ?1 AND is_active = 1 AND {LEAVES_ANOTHER_ADMIN}"
                ),
                [id],
            )
            .await?;
        if changed == 0 {
            if !self.get_user(id).await?.is_active {
                return Ok(());
            }
            return Err(DatabaseError::Conflict(
                "Cannot delete the last active administrator".into(),
            ));
        }
        self.delete_user_sessions(id).await?;

        tracing::info!(id, username = %user.username, "user deactivated");
        self.log_action(
            ctx.event("User deleted", AuditActionType::Delete, RESOURCE)
                .resource(user.id, &user.username),
        )
        .await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no user has this id.
    pub async fn reactivate_user(
        &self,
        id: i64,
        ctx: &ActionContext,
    ) -> Result<User, DatabaseError> {
        let user = self.get_user(id).await?;
        if user.is_active {
            return Ok(user);
        }
        self.db()
            .conn()
            .execute("UPDATE users SET is_active = 1 WHERE id = ?1", [id])
            .await?;
        self.log_action(
            ctx.event("User reactivated", AuditActionType::Update, RESOURCE)
                .resource(user.id, &user.username),
        )
        .await;
        self.get_user(id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound`, or `Validation` for a short password.
    pub async fn change_password(
        &self,
        id: i64,
        new_password: &str,
        ctx: &ActionContext,
    ) -> Result<(), DatabaseError> {
        validate_password(new_password)?;
        let user = self.get_user(id).await?;
        let hash = hash_password(new_password, self.bcrypt_cost()).await?;
        self.db()
            .conn()
            .execute(
                "UPDATE users SET password_hash = ?1 WHERE id = ?2",
                libsql::params![hash, id],
            )
            .await?;
        self.log_action(
            ctx.event("Password changed", AuditActionType::Update, RESOURCE)
                .resource(user.id, &user.username),
        )
        .await;
        Ok(())
    }

    async fn collect_users(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<User>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Active users whose full name contains `term`, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn search_users(&self, term: &str) -> Result<Vec<User>, DatabaseError> {
        self.collect_users(
            &format!(
                "SELECT {SELECT_COLS} FROM users \
                 WHERE is_active = 1 AND lower(full_name) LIKE ?1 ESCAPE '\\' \
                 ORDER BY full_name"
            ),
            [like_contains(term.trim())],
        )
        .await
    }

    /// One page of users, optionally narrowed by a search term (username,
    /// email or full name) and a role.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_users(
        &self,
        page: &PageRequest,
        search: Option<&str>,
        role: Option<Role>,
    ) -> Result<Page<User>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            params.push(like_contains(term).into());
            let n = params.len();
            conditions.push(format!(
                "(lower(username) LIKE ?{n} ESCAPE '\\' OR lower(email) LIKE ?{n} ESCAPE '\\' \
                 OR lower(full_name) LIKE ?{n} ESCAPE '\\')"
            ));
        }
        if let Some(role) = role {
            params.push(role.as_str().into());
            conditions.push(format!("role = ?{}", params.len()));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let total = self
            .query_count(
                &format!("SELECT COUNT(*) FROM users{where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let users = self
            .collect_users(
                &format!(
                    "SELECT {SELECT_COLS} FROM users{where_clause} \
                     ORDER BY {} {}, id ASC LIMIT {} OFFSET {}",
                    sort_column(&page.sort_by),
                    page.sort_dir.as_sql(),
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(Page::new(users, page, total))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn user_stats(&self) -> Result<UserStats, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*), \
                        COALESCE(SUM(CASE WHEN role = 'ADMIN' THEN 1 ELSE 0 END), 0), \
                        COALESCE(SUM(CASE WHEN role = 'SUPER_ADMIN' THEN 1 ELSE 0 END), 0) \
                 FROM users WHERE is_active = 1",
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(UserStats {
            total_active: get_count(&row, 0)?,
            admins: get_count(&row, 1)?,
            super_admins: get_count(&row, 2)?,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_users(&self) -> Result<u64, DatabaseError> {
        self.query_count("SELECT COUNT(*) FROM users", ()).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_active_users(&self) -> Result<u64, DatabaseError> {
        self.query_count("SELECT COUNT(*) FROM users WHERE is_active = 1", ())
            .await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn is_username_available(
        &self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let taken = self
            .query_count(
                "SELECT COUNT(*) FROM users WHERE username = ?1 AND id != ?2",
                libsql::params![username.trim(), exclude_id.unwrap_or(-1)],
            )
            .await?;
        Ok(taken == 0)
    }

    /// Emails compare case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn is_email_available(
        &self,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, DatabaseError> {
        let taken = self
            .query_count(
                "SELECT COUNT(*) FROM users WHERE lower(email) = ?1 AND id != ?2",
                libsql::params![email.trim().to_lowercase(), exclude_id.unwrap_or(-1)],
            )
            .await?;
        Ok(taken == 0)
    }

    /// Check credentials and stamp `last_login`.
    ///
    /// Unknown users, inactive users and wrong passwords all yield the same
    /// error so the response does not reveal which one it was.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Auth(AuthError::InvalidCredentials)` on any mismatch.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, DatabaseError> {
        let Some(mut user) = self.get_user_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials.into());
        };
        if !user.is_active || !verify_password(password, &user.password_hash).await? {
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "UPDATE users SET last_login = ?1 WHERE id = ?2",
                libsql::params![fmt_datetime(now), user.id],
            )
            .await?;
        user.last_login = Some(now);
        Ok(user)
    }

    /// Create the bootstrap administrator when the users table is empty.
    ///
    /// Returns the created user, or `None` if nothing was done.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the configured account fails validation or
    /// cannot be stored.
    pub async fn ensure_default_admin(
        &self,
        config: &BootstrapAdminConfig,
    ) -> Result<Option<User>, DatabaseError> {
        if !config.enabled || self.count_users().await? > 0 {
            return Ok(None);
        }
        let user = self
            .create_user(
                NewUser {
                    username: config.username.clone(),
                    email: config.email.clone(),
                    password: config.password.clone(),
                    full_name: Some(config.full_name.clone()),
                    role: Role::Admin,
                    is_active: true,
                },
                &ActionContext::system(),
            )
            .await?;
        tracing::warn!(
            username = %user.username,
            "created default administrator; change its password"
        );
        Ok(Some(user))
    }
}
