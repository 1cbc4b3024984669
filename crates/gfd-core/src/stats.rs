//! Statistics DTOs returned by the admin API and the `gfd stats` command.
//!
//! Rates are percentages in `0.0..=100.0` and are `0.0` when the denominator is zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `part / whole * 100`, or `0.0` when `whole` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Round to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_tracks: u64,
    pub sessions_today: u64,
    pub sessions_this_week: u64,
    pub success_rate: f64,
    pub audit_entries_this_week: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivityStats {
    pub date: String,
    pub total_sessions: u64,
    pub successful_sessions: u64,
    pub failed_sessions: u64,
    pub success_rate: f64,
}

impl DailyActivityStats {
    #[must_use]
    pub fn new(date: String, total: u64, successful: u64, failed: u64) -> Self {
        Self {
            date,
            total_sessions: total,
            successful_sessions: successful,
            failed_sessions: failed,
            success_rate: percentage(successful, total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackSuccessStats {
    pub track_id: i64,
    pub track_name: String,
    pub total_sessions: u64,
    pub successful_sessions: u64,
    pub avg_moves: f64,
    pub success_rate: f64,
}

impl TrackSuccessStats {
    #[must_use]
    pub fn new(track_id: i64, track_name: String, total: u64, successful: u64, avg_moves: f64) -> Self {
        Self {
            track_id,
            track_name,
            total_sessions: total,
            successful_sessions: successful,
            avg_moves,
            success_rate: percentage(successful, total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStats {
    pub device_type: String,
    pub total_sessions: u64,
    pub successful_sessions: u64,
    pub success_rate: f64,
}

impl DeviceStats {
    #[must_use]
    pub fn new(device_type: String, total: u64, successful: u64) -> Self {
        Self {
            device_type,
            total_sessions: total,
            successful_sessions: successful,
            success_rate: percentage(successful, total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackTimeStats {
    pub track_name: String,
    pub avg_execution_time_ms: i64,
    pub avg_moves: f64,
    pub total_sessions: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorStats {
    pub error_message: String,
    pub frequency: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserAuditStats {
    pub username: String,
    pub action_counts: BTreeMap<String, u64>,
    pub total_actions: u64,
}

impl UserAuditStats {
    #[must_use]
    pub fn new(username: String, action_counts: BTreeMap<String, u64>) -> Self {
        let total_actions = action_counts.values().sum();
        Self {
            username,
            action_counts,
            total_actions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemOverviewStats {
    pub total_sessions: u64,
    pub successful_sessions: u64,
    pub failed_sessions: u64,
    pub avg_moves: f64,
    pub avg_execution_time_ms: i64,
    pub success_rate: f64,
}

impl SystemOverviewStats {
    #[must_use]
    pub fn new(
        total: u64,
        successful: u64,
        failed: u64,
        avg_moves: f64,
        avg_execution_time_ms: i64,
    ) -> Self {
        Self {
            total_sessions: total,
            successful_sessions: successful,
            failed_sessions: failed,
            avg_moves,
            avg_execution_time_ms,
            success_rate: percentage(successful, total),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemReport {
    pub generated_at: DateTime<Utc>,
    pub dashboard_stats: DashboardStats,
    pub daily_activity: Vec<DailyActivityStats>,
    pub track_success: Vec<TrackSuccessStats>,
    pub device_stats: Vec<DeviceStats>,
    pub time_stats: Vec<TrackTimeStats>,
    pub error_stats: Vec<ErrorStats>,
    pub audit_stats: Vec<UserAuditStats>,
    pub overview_stats: SystemOverviewStats,
}

/// Quick numbers shown on the game page.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicGameStats {
    pub total_sessions_this_week: u64,
    pub successful_sessions: u64,
    pub available_tracks: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditStatistics {
    pub today_audit_entries: u64,
    pub active_users: u64,
    pub total_audit_entries: u64,
    pub last_audit_entry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayCount {
    pub date: String,
    pub games: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HourCount {
    pub hour: u32,
    pub games: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameStatusSplit {
    pub completed: u64,
    pub in_progress: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackGameStats {
    pub track_name: String,
    pub total_games: u64,
    pub completed_games: u64,
    pub success_rate: f64,
    /// Average execution time of successful runs, in seconds.
    pub average_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStatistics {
    pub total_games: u64,
    pub completed_games: u64,
    pub active_users: u64,
    /// Average completion time in whole minutes.
    pub average_time: i64,
    pub daily_activity: Vec<DayCount>,
    pub game_status: GameStatusSplit,
    pub track_stats: Vec<TrackGameStats>,
    pub hourly_activity: Vec<HourCount>,
}

/// Zero-filled per-day series for the dashboard chart.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySeries {
    pub labels: Vec<String>,
    pub audit_activity: Vec<u64>,
    pub game_activity: Vec<u64>,
    pub period: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackStats {
    pub total_active: u64,
    pub by_difficulty: BTreeMap<i32, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_active: u64,
    pub admins: u64,
    pub super_admins: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceActivity {
    pub resource_type: String,
    pub resource_name: Option<String>,
    pub modifications: u64,
}

/// Legacy `/api/game/stats` payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionTotals {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub completion_rate: f64,
}
