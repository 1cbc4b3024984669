//! Track update builder.

use serde::Serialize;
use gfd_core::enums::Direction;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_x: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_y: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl TrackUpdate {
    /// Whether the grid or start pose changes, which requires re-validating the start cell.
    #[must_use]
    pub const fn touches_layout(&self) -> bool {
        self.grid_config.is_some() || self.start_x.is_some() || self.start_y.is_some()
    }
}

pub struct TrackUpdateBuilder(TrackUpdate);

impl TrackUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(TrackUpdate::default())
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn grid_config(mut self, grid_config: impl Into<String>) -> Self {
        self.0.grid_config = Some(grid_config.into());
        self
    }

    #[must_use]
    pub const fn start(mut self, x: i32, y: i32) -> Self {
        self.0.start_x = Some(x);
        self.0.start_y = Some(y);
        self
    }

    #[must_use]
    pub const fn start_direction(mut self, direction: Direction) -> Self {
        self.0.start_direction = Some(direction);
        self
    }

    #[must_use]
    pub const fn difficulty_level(mut self, level: i32) -> Self {
        self.0.difficulty_level = Some(level);
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.0.description = Some(description);
        self
    }

    #[must_use]
    pub const fn active(mut self, is_active: bool) -> Self {
        self.0.is_active = Some(is_active);
        self
    }

    #[must_use]
    pub fn build(self) -> TrackUpdate {
        self.0
    }
}

impl Default for TrackUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
