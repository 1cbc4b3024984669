use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Role;
use crate::errors::CoreError;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MIN_PASSWORD_LEN: usize = 6;

/// A back-office account.
///
/// `password_hash` never leaves the process: it is skipped by serde, so API
/// responses and exports cannot leak it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
}

/// # Errors
///
/// Returns `CoreError::Validation` if the username is blank or outside 3..=50 chars.
pub fn validate_username(username: &str) -> Result<String, CoreError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CoreError::validation("Username is required"));
    }
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(CoreError::validation(format!(
            "Username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username.to_string())
}

/// Structural email check: one `@`, non-empty local part, dotted domain, no whitespace.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the address is blank or malformed.
pub fn validate_email(email: &str) -> Result<String, CoreError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(CoreError::validation("Email is required"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split('.')
                    .filter(|part| !part.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(email.to_string())
    } else {
        Err(CoreError::validation("Email must be a valid address"))
    }
}

/// # Errors
///
/// Returns `CoreError::Validation` if the password is shorter than 6 characters.
pub fn validate_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CoreError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Join first and last name, falling back to the username when both are blank.
#[must_use]
pub fn compose_full_name(first: Option<&str>, last: Option<&str>, username: &str) -> String {
    let parts: Vec<&str> = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        username.trim().to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("admin@gamefordevs.com", true)]
    #[case("a.b+c@sub.example.org", true)]
    #[case("no-at-sign.com", false)]
    #[case("@example.com", false)]
    #[case("user@localhost", false)]
    #[case("user@@example.com", false)]
    #[case("us er@example.com", false)]
    #[case("user@example.", false)]
    fn email_shapes(#[case] email: &str, #[case] ok: bool) {
        assert_eq!(validate_email(email).is_ok(), ok, "{email}");
    }

    #[test]
    fn username_length_bounds() {
        assert!(validate_username("ab").is_err());
        assert_eq!(validate_username("  abc ").unwrap(), "abc");
        assert!(validate_username(&"u".repeat(MAX_USERNAME_LEN + 1)).is_err());
    }

    #[test]
    fn password_minimum() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn full_name_composition() {
        assert_eq!(compose_full_name(Some(" Ada "), Some("Lovelace"), "ada"), "Ada Lovelace");
        assert_eq!(compose_full_name(None, Some("Lovelace"), "ada"), "Lovelace");
        assert_eq!(compose_full_name(Some(""), Some("  "), "ada"), "ada");
    }
}
