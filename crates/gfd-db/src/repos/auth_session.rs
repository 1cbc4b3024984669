//! Login sessions for the admin area.
//!
//! A session row maps an opaque token (held by the browser in an `HttpOnly`
//! cookie) to a user until `expires_at`. Expired rows are removed lazily on
//! lookup and in bulk by [`GameService::purge_expired_sessions`].

use chrono::{TimeDelta, Utc};

use gfd_auth::token::{generate_session_token, looks_like_session_token};
use gfd_auth::{AuthError, AuthSession, Principal};
use gfd_core::entities::User;
use gfd_core::enums::AuditActionType;

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, get_opt_string, parse_datetime, parse_enum};
use crate::service::{ActionContext, GameService};

const RESOURCE: &str = "AUTH";

impl GameService {
    /// Mint and store a session token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` when `ttl` overflows the clock, or
    /// another `DatabaseError` if the token cannot be generated or stored.
    pub async fn create_auth_session(
        &self,
        user: &User,
        ttl: TimeDelta,
        ctx: &ActionContext,
    ) -> Result<AuthSession, DatabaseError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| DatabaseError::Validation("Session lifetime is out of range".into()))?;
        let session = AuthSession {
            token: generate_session_token()?,
            user_id: user.id,
            created_at: now,
            expires_at,
            ip_address: ctx.ip_address.clone(),
            user_agent: ctx.user_agent.clone(),
        };
        self.db()
            .conn()
            .execute(
                "INSERT INTO auth_sessions (token, user_id, created_at, expires_at, ip_address, user_agent)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                libsql::params![
                    session.token.as_str(),
                    session.user_id,
                    fmt_datetime(session.created_at),
                    fmt_datetime(session.expires_at),
                    session.ip_address.as_deref(),
                    session.user_agent.as_deref()
                ],
            )
            .await?;
        Ok(session)
    }

    /// Resolve a cookie token to the active user behind it.
    ///
    /// Returns `None` for unknown, malformed or expired tokens, and for users
    /// who have since been deactivated.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<Principal>, DatabaseError> {
        if !looks_like_session_token(token) {
            return Ok(None);
        }
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT u.id, u.username, u.full_name, u.role, s.expires_at
                 FROM auth_sessions s JOIN users u ON u.id = s.user_id
                 WHERE s.token = ?1 AND u.is_active = 1",
                [token],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let principal = Principal {
            user_id: row.get(0)?,
            username: row.get(1)?,
            full_name: get_opt_string(&row, 2)?.unwrap_or_default(),
            role: parse_enum(&row.get::<String>(3)?)?,
            expires_at: parse_datetime(&row.get::<String>(4)?)?,
        };

        if principal.is_expired(Utc::now()) {
            self.delete_auth_session(token).await?;
            return Ok(None);
        }
        Ok(Some(principal))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete_auth_session(&self, token: &str) -> Result<bool, DatabaseError> {
        let deleted = self
            .db()
            .conn()
            .execute("DELETE FROM auth_sessions WHERE token = ?1", [token])
            .await?;
        Ok(deleted > 0)
    }

    /// Revoke every session of one user.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn delete_user_sessions(&self, user_id: i64) -> Result<u64, DatabaseError> {
        Ok(self
            .db()
            .conn()
            .execute("DELETE FROM auth_sessions WHERE user_id = ?1", [user_id])
            .await?)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn purge_expired_sessions(&self) -> Result<u64, DatabaseError> {
        let purged = self
            .db()
            .conn()
            .execute(
                "DELETE FROM auth_sessions WHERE expires_at <= ?1",
                [fmt_datetime(Utc::now())],
            )
            .await?;
        if purged > 0 {
            tracing::debug!(purged, "expired login sessions removed");
        }
        Ok(purged)
    }

    /// Check credentials and open a session. Both outcomes are audited.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Auth(AuthError::InvalidCredentials)` when the
    /// credentials do not match an active account.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ttl: TimeDelta,
        ctx: &ActionContext,
    ) -> Result<(User, AuthSession), DatabaseError> {
        let attempted = username.trim();
        let actor = ActionContext::user(attempted)
            .with_client(ctx.ip_address.clone(), ctx.user_agent.clone());

        let user = match self.authenticate(attempted, password).await {
            Ok(user) => user,
            Err(DatabaseError::Auth(AuthError::InvalidCredentials)) => {
                tracing::info!(username = attempted, "login rejected");
                self.log_failed_action(
                    actor.event("Login failed", AuditActionType::Login, RESOURCE),
                    AuthError::InvalidCredentials.to_string(),
                )
                .await;
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(other) => return Err(other),
        };

        let session = self.create_auth_session(&user, ttl, ctx).await?;
        tracing::info!(username = %user.username, "user logged in");
        self.log_action(
            actor
                .event("User logged in", AuditActionType::Login, RESOURCE)
                .resource(user.id, &user.username),
        )
        .await;
        Ok((user, session))
    }

    /// End the session behind `token`, auditing the logout if it existed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lookup or delete fails.
    pub async fn logout(&self, token: &str, ctx: &ActionContext) -> Result<(), DatabaseError> {
        let principal = self.resolve_session(token).await?;
        self.delete_auth_session(token).await?;
        if let Some(principal) = principal {
            let actor = ActionContext::user(&principal.username)
                .with_client(ctx.ip_address.clone(), ctx.user_agent.clone());
            self.log_action(
                actor
                    .event("User logged out", AuditActionType::Logout, RESOURCE)
                    .resource(principal.user_id, &principal.username),
            )
            .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::audit::AuditFilter;
    use crate::repos::user::NewUser;
    use crate::test_support::helpers::{admin, test_service};
    use gfd_core::enums::{AuditStatus, Role};
    use pretty_assertions::assert_eq;

    async fn seed_user(svc: &GameService, username: &str) -> User {
        svc.create_user(
            NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                password: "secret1".into(),
                full_name: Some("Test Admin".into()),
                role: Role::Admin,
                is_active: true,
            },
            &admin(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn login_then_resolve() {
        let svc = test_service().await;
        seed_user(&svc, "alice").await;
        let ctx = ActionContext::system().with_client(Some("10.0.0.7".into()), None);

        let (user, session) = svc
            .login("alice", "secret1", TimeDelta::hours(8), &ctx)
            .await
            .unwrap();
        assert_eq!(session.user_id, user.id);
        assert_eq!(session.ip_address.as_deref(), Some("10.0.0.7"));

        let principal = svc.resolve_session(&session.token).await.unwrap().unwrap();
        assert_eq!(principal.username, "alice");
        assert_eq!(principal.full_name, "Test Admin");
        assert!(principal.can_access_admin());

        let audit = svc.list_audit(&AuditFilter::default()).await.unwrap();
        assert_eq!(audit[0].action, "User logged in");
        assert_eq!(audit[0].username, "alice");
        assert_eq!(audit[0].ip_address.as_deref(), Some("10.0.0.7"));
    }

    #[tokio::test]
    async fn failed_login_is_audited() {
        let svc = test_service().await;
        seed_user(&svc, "alice").await;

        let err = svc
            .login("alice", "wrong", TimeDelta::hours(8), &ActionContext::system())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid username or password");

        let filter = AuditFilter {
            status: Some(AuditStatus::Failed),
            ..AuditFilter::default()
        };
        let failed = svc.list_audit(&filter).await.unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].action_type, AuditActionType::Login);
        assert_eq!(failed[0].username, "alice");
    }

    #[tokio::test]
    async fn expired_session_resolves_to_none_and_is_removed() {
        let svc = test_service().await;
        let user = seed_user(&svc, "alice").await;
        let session = svc
            .create_auth_session(&user, TimeDelta::seconds(-1), &ActionContext::system())
            .await
            .unwrap();

        assert!(svc.resolve_session(&session.token).await.unwrap().is_none());
        assert!(!svc.delete_auth_session(&session.token).await.unwrap());
    }

    #[tokio::test]
    async fn overflowing_ttl_is_a_validation_error() {
        let svc = test_service().await;
        let user = seed_user(&svc, "alice").await;
        let err = svc
            .create_auth_session(&user, TimeDelta::MAX, &ActionContext::system())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert_eq!(svc.purge_expired_sessions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn garbage_token_resolves_to_none() {
        let svc = test_service().await;
        assert!(svc.resolve_session("not a token").await.unwrap().is_none());
        assert!(
            svc.resolve_session(&generate_session_token().unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn purge_removes_only_expired() {
        let svc = test_service().await;
        let user = seed_user(&svc, "alice").await;
        let ctx = ActionContext::system();
        svc.create_auth_session(&user, TimeDelta::seconds(-5), &ctx)
            .await
            .unwrap();
        let live = svc
            .create_auth_session(&user, TimeDelta::hours(1), &ctx)
            .await
            .unwrap();

        assert_eq!(svc.purge_expired_sessions().await.unwrap(), 1);
        assert!(svc.resolve_session(&live.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn logout_revokes_and_audits() {
        let svc = test_service().await;
        seed_user(&svc, "alice").await;
        let (_, session) = svc
            .login("alice", "secret1", TimeDelta::hours(1), &ActionContext::system())
            .await
            .unwrap();

        svc.logout(&session.token, &ActionContext::system())
            .await
            .unwrap();
        assert!(svc.resolve_session(&session.token).await.unwrap().is_none());

        let latest = svc.latest_audit().await.unwrap().unwrap();
        assert_eq!(latest.action_type, AuditActionType::Logout);
        assert_eq!(latest.username, "alice");
    }

    #[tokio::test]
    async fn deactivated_user_loses_sessions() {
        let svc = test_service().await;
        seed_user(&svc, "alice").await;
        let bob = seed_user(&svc, "bob").await;
        let session = svc
            .create_auth_session(&bob, TimeDelta::hours(1), &ActionContext::system())
            .await
            .unwrap();

        svc.delete_user(bob.id, &admin()).await.unwrap();
        assert!(svc.resolve_session(&session.token).await.unwrap().is_none());
    }
}
