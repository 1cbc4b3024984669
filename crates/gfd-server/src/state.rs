use std::sync::Arc;

use chrono::TimeDelta;

use gfd_config::{GameConfig, SESSION_TTL_HOURS_RANGE};
use gfd_db::service::GameService;

/// Shared handler state. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GameService>,
    pub config: Arc<GameConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(service: GameService, config: GameConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }

    /// Configured login lifetime, clamped to the range config validation allows.
    #[must_use]
    pub fn session_ttl(&self) -> TimeDelta {
        let hours = self.config.auth.session_ttl_hours.clamp(
            *SESSION_TTL_HOURS_RANGE.start(),
            *SESSION_TTL_HOURS_RANGE.end(),
        );
        TimeDelta::try_hours(hours).unwrap_or(TimeDelta::hours(8))
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.config.auth.cookie_name
    }
}
