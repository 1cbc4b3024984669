//! Admin authentication configuration.

use serde::{Deserialize, Serialize};

const fn default_session_ttl_hours() -> i64 {
    8
}

const fn default_bcrypt_cost() -> u32 {
    10
}

fn default_cookie_name() -> String {
    "GFD_SESSION".into()
}

const fn default_enabled() -> bool {
    true
}

fn default_admin_username() -> String {
    "admin".into()
}

fn default_admin_password() -> String {
    "admin123".into()
}

fn default_admin_email() -> String {
    "admin@gamefordevs.com".into()
}

fn default_admin_full_name() -> String {
    "System Administrator".into()
}

/// Admin account created on startup when no admin exists yet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BootstrapAdminConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_admin_username")]
    pub username: String,

    #[serde(default = "default_admin_password")]
    pub password: String,

    #[serde(default = "default_admin_email")]
    pub email: String,

    #[serde(default = "default_admin_full_name")]
    pub full_name: String,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            username: default_admin_username(),
            password: default_admin_password(),
            email: default_admin_email(),
            full_name: default_admin_full_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Lifetime of a login session.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    /// bcrypt work factor for new password hashes (4..=31).
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Add the `Secure` attribute to the session cookie.
    #[serde(default)]
    pub secure_cookie: bool,

    #[serde(default)]
    pub bootstrap_admin: BootstrapAdminConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: default_session_ttl_hours(),
            bcrypt_cost: default_bcrypt_cost(),
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            bootstrap_admin: BootstrapAdminConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = AuthConfig::default();
        assert_eq!(config.session_ttl_hours, 8);
        assert_eq!(config.bcrypt_cost, 10);
        assert_eq!(config.cookie_name, "GFD_SESSION");
        assert!(!config.secure_cookie);
        assert!(config.bootstrap_admin.enabled);
        assert_eq!(config.bootstrap_admin.username, "admin");
        assert_eq!(config.bootstrap_admin.email, "admin@gamefordevs.com");
    }
}
