use serde::de::DeserializeOwned;

/// Parse a wire enum (`SUPER_ADMIN`) from friendlier input like `super-admin`.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().replace('-', "_").to_ascii_uppercase();
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

#[cfg(test)]
mod tests {
    use gfd_core::enums::{AuditActionType, Role};
    use pretty_assertions::assert_eq;

    use super::parse_enum;

    #[test]
    fn parses_hyphenated_lowercase() {
        let role: Role = parse_enum("super-admin", "role").expect("role should parse");
        assert_eq!(role, Role::SuperAdmin);
    }

    #[test]
    fn parses_wire_form() {
        let action: AuditActionType = parse_enum("LOGIN", "action").expect("action should parse");
        assert_eq!(action, AuditActionType::Login);
    }

    #[test]
    fn errors_name_the_field() {
        let err = parse_enum::<Role>("owner", "role").expect_err("should fail");
        assert!(err.to_string().contains("invalid role 'owner'"));
    }
}
