use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuditActionType, AuditStatus};

/// Username recorded when no one is logged in.
pub const SYSTEM_USERNAME: &str = "system";

/// A persisted audit entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: i64,
    pub username: String,
    pub action: String,
    pub action_type: AuditActionType,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
}

/// An audit entry about to be written.
///
/// ```
/// use gfd_core::entities::AuditEvent;
/// use gfd_core::enums::AuditActionType;
///
/// let event = AuditEvent::new(Some("admin"), "Track created", AuditActionType::Create, "Track")
///     .resource(7, "Spiral");
/// assert_eq!(event.resource_id.as_deref(), Some("7"));
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuditEvent {
    pub username: String,
    pub action: String,
    pub action_type: AuditActionType,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub resource_name: Option<String>,
    pub details: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
}

impl AuditEvent {
    /// A successful event. A missing or blank `username` is recorded as `system`.
    #[must_use]
    pub fn new(
        username: Option<&str>,
        action: impl Into<String>,
        action_type: AuditActionType,
        resource_type: impl Into<String>,
    ) -> Self {
        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(SYSTEM_USERNAME)
            .to_string();
        Self {
            username,
            action: action.into(),
            action_type,
            resource_type: resource_type.into(),
            resource_id: None,
            resource_name: None,
            details: None,
            ip_address: None,
            user_agent: None,
            status: AuditStatus::Success,
            error_message: None,
        }
    }

    #[must_use]
    pub fn resource(mut self, id: impl ToString, name: impl Into<String>) -> Self {
        self.resource_id = Some(id.to_string());
        self.resource_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn resource_id(mut self, id: impl ToString) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    #[must_use]
    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// Mark the event as failed with the given error.
    #[must_use]
    pub fn failed(mut self, error_message: impl Into<String>) -> Self {
        self.status = AuditStatus::Failed;
        self.error_message = Some(error_message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_username_becomes_system() {
        let e = AuditEvent::new(Some("  "), "x", AuditActionType::Read, "Page");
        assert_eq!(e.username, SYSTEM_USERNAME);
        let e = AuditEvent::new(None, "x", AuditActionType::Read, "Page");
        assert_eq!(e.username, SYSTEM_USERNAME);
    }

    #[test]
    fn failed_sets_status_and_message() {
        let e = AuditEvent::new(Some("bob"), "Login", AuditActionType::Login, "User")
            .failed("Bad credentials");
        assert_eq!(e.status, AuditStatus::Failed);
        assert_eq!(e.error_message.as_deref(), Some("Bad credentials"));
    }
}
