use chrono::{DateTime, Utc};
use gfd_core::enums::Role;
use serde::{Deserialize, Serialize};

/// A persisted login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// The authenticated admin behind a request.
///
/// Produced by resolving the session cookie, consumed by admin handlers for
/// authorization and for stamping audit entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    #[must_use]
    pub const fn can_access_admin(&self) -> bool {
        self.role.can_access_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn principal(role: Role, expires_at: DateTime<Utc>) -> Principal {
        Principal {
            user_id: 1,
            username: "admin".into(),
            full_name: "System Administrator".into(),
            role,
            expires_at,
        }
    }

    #[test]
    fn expiry_is_inclusive() {
        let now = Utc::now();
        assert!(principal(Role::Admin, now).is_expired(now));
        assert!(!principal(Role::Admin, now + TimeDelta::hours(1)).is_expired(now));
    }

    #[test]
    fn both_roles_reach_admin_area() {
        let later = Utc::now() + TimeDelta::hours(1);
        assert!(principal(Role::Admin, later).can_access_admin());
        assert!(principal(Role::SuperAdmin, later).can_access_admin());
    }
}
