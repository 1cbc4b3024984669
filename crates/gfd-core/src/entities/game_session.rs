use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{DeviceType, GameStatus};
use crate::errors::CoreError;

/// One play-through of a track by an anonymous visitor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    pub id: i64,
    pub session_id: String,
    pub track_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: GameStatus,
    pub moves_count: i64,
    pub execution_time_ms: Option<i64>,
    pub error_position_x: Option<i32>,
    pub error_position_y: Option<i32>,
    pub error_message: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub screen_resolution: Option<String>,
    pub device_type: DeviceType,
    pub moves_sequence: Option<String>,
    pub attempts_count: i64,
    pub cells_visited: i64,
    pub total_cells_required: i64,
}

impl GameSession {
    /// Milliseconds between start and end, if the session has ended.
    #[must_use]
    pub fn duration_ms(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds())
    }

    /// Share of required path cells visited, in percent, capped at 100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_percentage(&self) -> f64 {
        if self.total_cells_required <= 0 {
            return 0.0;
        }
        let pct = self.cells_visited as f64 / self.total_cells_required as f64 * 100.0;
        pct.clamp(0.0, 100.0)
    }

    /// Move to `next`, stamping `end_time` for SUCCESS and FAILED.
    ///
    /// Re-applying the current status is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the state machine forbids the move.
    pub fn transition_to(&mut self, next: GameStatus, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                entity_type: "GameSession".into(),
                id: self.session_id.clone(),
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        if next.ends_session() {
            self.end_time = Some(now);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the session already finished.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.transition_to(GameStatus::Success, now)
    }

    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the session already finished.
    pub fn mark_failed(
        &mut self,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.transition_to(GameStatus::Failed, now)?;
        self.error_message = Some(message.into());
        Ok(())
    }
}
