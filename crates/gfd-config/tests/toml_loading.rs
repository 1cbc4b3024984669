//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Format, Serialized, Toml},
};
use gfd_config::GameConfig;
use pretty_assertions::assert_eq;

#[test]
fn loads_server_config_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[server]
host = "127.0.0.1"
port = 9090
cors_allowed_origins = ["http://localhost:3000"]
"#,
        )?;

        let config: GameConfig = Figment::from(Serialized::defaults(GameConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(
            config.server.cors_allowed_origins,
            vec!["http://localhost:3000".to_string()]
        );
        assert!(!config.server.allows_any_origin());
        Ok(())
    });
}

#[test]
fn loads_nested_bootstrap_admin_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[auth]
session_ttl_hours = 2
cookie_name = "SID"

[auth.bootstrap_admin]
username = "root"
password = "s3cret!"
"#,
        )?;

        let config: GameConfig = Figment::from(Serialized::defaults(GameConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.auth.session_ttl_hours, 2);
        assert_eq!(config.auth.cookie_name, "SID");
        assert_eq!(config.auth.bootstrap_admin.username, "root");
        assert_eq!(config.auth.bootstrap_admin.password, "s3cret!");
        // Untouched fields keep their defaults.
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.auth.bootstrap_admin.email, "admin@gamefordevs.com");
        Ok(())
    });
}

#[test]
fn project_config_is_picked_up_by_figment() {
    Jail::expect_with(|jail| {
        jail.create_dir(".gfd")?;
        jail.create_file(
            ".gfd/config.toml",
            r#"
[database]
path = "data/game.db"
audit_trail_dir = "data/audit"

[general]
default_page_size = 25
"#,
        )?;

        let config = GameConfig::load().expect("config loads");
        assert_eq!(config.database.path, "data/game.db");
        assert_eq!(config.database.audit_trail_dir, "data/audit");
        assert_eq!(config.general.default_page_size, 25);
        Ok(())
    });
}

#[test]
fn out_of_range_toml_value_is_rejected() {
    Jail::expect_with(|jail| {
        jail.create_dir(".gfd")?;
        jail.create_file(
            ".gfd/config.toml",
            r#"
[auth]
bcrypt_cost = 40
"#,
        )?;

        let err = GameConfig::load().unwrap_err();
        assert!(err.to_string().contains("auth.bcrypt_cost"));
        Ok(())
    });
}
