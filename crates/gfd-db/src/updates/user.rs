//! Admin user update builder.

use serde::Serialize;
use gfd_core::enums::Role;

/// Changes to an admin account.
///
/// `password` is never serialized; audit details only record that it changed.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// The new password, if one was given and is not blank.
    #[must_use]
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.trim().is_empty())
    }
}

pub struct UserUpdateBuilder(UserUpdate);

impl UserUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(UserUpdate::default())
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.0.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.0.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.0.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn full_name(mut self, full_name: impl Into<String>) -> Self {
        self.0.full_name = Some(full_name.into());
        self
    }

    #[must_use]
    pub const fn role(mut self, role: Role) -> Self {
        self.0.role = Some(role);
        self
    }

    #[must_use]
    pub const fn active(mut self, is_active: bool) -> Self {
        self.0.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn build(self) -> UserUpdate {
        self.0
    }
}

impl Default for UserUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_serialized() {
        let update = UserUpdateBuilder::new().password("hunter22").role(Role::Admin).build();
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "ADMIN");
    }

    #[test]
    fn blank_password_means_unchanged() {
        let update = UserUpdateBuilder::new().password("   ").build();
        assert_eq!(update.new_password(), None);
    }
}
