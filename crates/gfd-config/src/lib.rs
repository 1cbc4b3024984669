//! # gfd-config
//!
//! Layered configuration loading for Game for Devs using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GFD_*` prefix, `__` as separator)
//! 2. Project-level `.gfd/config.toml`
//! 3. User-level `~/.config/game-for-devs/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `GFD_SERVER__PORT` -> `server.port`,
//! `GFD_AUTH__BOOTSTRAP_ADMIN__PASSWORD` -> `auth.bootstrap_admin.password`, etc.
//!
//! ```no_run
//! use gfd_config::GameConfig;
//!
//! let config = GameConfig::load_with_dotenv().expect("config");
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

mod auth;
mod database;
mod error;
mod general;
mod server;

pub use auth::{AuthConfig, BootstrapAdminConfig};
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// bcrypt accepts work factors in this range.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

/// Login sessions last between one hour and one year.
pub const SESSION_TTL_HOURS_RANGE: std::ops::RangeInclusive<i64> = 1..=8760;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GameConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl GameConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Extract and validate from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".gfd/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("GFD_").split("__"))
    }

    /// Reject values the server cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !BCRYPT_COST_RANGE.contains(&self.auth.bcrypt_cost) {
            return Err(invalid("auth.bcrypt_cost", "must be between 4 and 31"));
        }
        if !SESSION_TTL_HOURS_RANGE.contains(&self.auth.session_ttl_hours) {
            return Err(invalid(
                "auth.session_ttl_hours",
                "must be between 1 and 8760",
            ));
        }
        if self.auth.cookie_name.trim().is_empty() {
            return Err(invalid("auth.cookie_name", "must not be empty"));
        }
        if self.general.max_page_size == 0 {
            return Err(invalid("general.max_page_size", "must be positive"));
        }
        if self.general.default_page_size == 0 || self.general.audit_page_size == 0 {
            return Err(invalid("general", "page sizes must be positive"));
        }
        if self.database.path.trim().is_empty() {
            return Err(invalid("database.path", "must not be empty"));
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("game-for-devs").join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.general.default_page_size, 10);
    }

    #[test]
    fn rejects_bcrypt_cost_out_of_range() {
        let mut config = GameConfig::default();
        config.auth.bcrypt_cost = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("auth.bcrypt_cost"));
    }

    #[test]
    fn session_ttl_bounds() {
        let mut config = GameConfig::default();
        for hours in [0, -1, 8761, i64::MAX] {
            config.auth.session_ttl_hours = hours;
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("auth.session_ttl_hours"), "{hours}");
        }
        config.auth.session_ttl_hours = 8760;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_max_page_size() {
        let mut config = GameConfig::default();
        config.general.max_page_size = 0;
        assert!(config.validate().is_err());
    }
}
