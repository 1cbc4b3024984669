//! Read-only aggregates over sessions, tracks, users and the audit log.
//!
//! Day and hour buckets are UTC, taken from the fixed-width timestamp text
//! (`substr(ts, 1, 10)` and `substr(ts, 12, 2)`).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use gfd_core::stats::{
    ActivitySeries, AuditStatistics, BasicGameStats, CompleteStatistics, DailyActivityStats,
    DashboardStats, DayCount, DeviceStats, ErrorStats, GameStatusSplit, HourCount,
    SystemOverviewStats, SystemReport, TrackGameStats, TrackSuccessStats, TrackTimeStats,
    UserAuditStats, percentage, round2,
};

use crate::error::DatabaseError;
use crate::helpers::{fmt_datetime, get_avg, get_count};
use crate::service::GameService;

/// Window used by the "recent" admin statistics.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Upper bound for caller-supplied day ranges.
pub const MAX_RANGE_DAYS: u32 = 365;

const TOP_ERRORS: u32 = 10;

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - TimeDelta::days(days)
}

fn clamp_days(days: u32) -> u32 {
    days.clamp(1, MAX_RANGE_DAYS)
}

#[allow(clippy::cast_possible_truncation)]
fn round_ms(value: f64) -> i64 {
    value.round() as i64
}

/// Render daily activity as CSV with a header row.
#[must_use]
pub fn daily_activity_csv(rows: &[DailyActivityStats]) -> String {
    let mut out = String::from("date,totalSessions,successfulSessions,failedSessions,successRate\n");
    for row in rows {
        let _ = writeln!(
            out,
            "{},{},{},{},{:.2}",
            row.date,
            row.total_sessions,
            row.successful_sessions,
            row.failed_sessions,
            row.success_rate
        );
    }
    out
}

impl GameService {
    async fn count_sessions_since(&self, since: DateTime<Utc>) -> Result<u64, DatabaseError> {
        self.query_count(
            "SELECT COUNT(*) FROM game_sessions WHERE start_time >= ?1",
            [fmt_datetime(since)],
        )
        .await
    }

    async fn count_sessions_with_status(&self, status: &str) -> Result<u64, DatabaseError> {
        self.query_count(
            "SELECT COUNT(*) FROM game_sessions WHERE status = ?1",
            [status],
        )
        .await
    }

    async fn count_sessions(&self) -> Result<u64, DatabaseError> {
        self.query_count("SELECT COUNT(*) FROM game_sessions", ())
            .await
    }

    /// Headline numbers for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, DatabaseError> {
        let now = Utc::now();
        let week_ago = days_ago(now, 7);
        let total = self.count_sessions().await?;
        let successful = self.count_sessions_with_status("SUCCESS").await?;

        Ok(DashboardStats {
            total_users: self.count_active_users().await?,
            total_tracks: self.count_active_tracks().await?,
            sessions_today: self
                .count_sessions_since(start_of_day(now.date_naive()))
                .await?,
            sessions_this_week: self.count_sessions_since(week_ago).await?,
            success_rate: round2(percentage(successful, total)),
            audit_entries_this_week: self.count_audit_between(week_ago, now).await?,
        })
    }

    /// Per-day session outcomes for the last `days` days, days without sessions omitted.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn daily_activity(&self, days: u32) -> Result<Vec<DailyActivityStats>, DatabaseError> {
        let since = days_ago(Utc::now(), i64::from(clamp_days(days)));
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT substr(start_time, 1, 10) AS day, COUNT(*), \
                        COALESCE(SUM(CASE WHEN status = 'SUCCESS' THEN 1 ELSE 0 END), 0), \
                        COALESCE(SUM(CASE WHEN status = 'FAILED' THEN 1 ELSE 0 END), 0) \
                 FROM game_sessions WHERE start_time >= ?1 \
                 GROUP BY day ORDER BY day",
                [fmt_datetime(since)],
            )
            .await?;
        let mut stats = Vec::new();
        while let Some(row) = rows.next().await? {
            stats.push(DailyActivityStats::new(
                row.get::<String>(0)?,
                get_count(&row, 1)?,
                get_count(&row, 2)?,
                get_count(&row, 3)?,
            ));
        }
        Ok(stats)
    }

    /// Outcome per track over the recent window, busiest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn track_success_stats(&self) -> Result<Vec<TrackSuccessStats>, DatabaseError> {
        let since = days_ago(Utc::now(), RECENT_WINDOW_DAYS);
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT t.id, t.name, COUNT(*) AS n, \
                        COALESCE(SUM(CASE WHEN s.status = 'SUCCESS' THEN 1 ELSE 0 END), 0), \
                        AVG(s.moves_count) \
                 FROM game_sessions s JOIN tracks t ON t.id = s.track_id \
                 WHERE s.start_time >= ?1 \
                 GROUP BY t.id, t.name ORDER BY n DESC, t.id",
                [fmt_datetime(since)],
            )
            .await?;
        let mut stats = Vec::new();
        while let Some(row) = rows.next().await? {
            stats.push(TrackSuccessStats::new(
                row.get(0)?,
                row.get(1)?,
                get_count(&row, 2)?,
                get_count(&row, 3)?,
                round2(get_avg(&row, 4)?),
            ));
        }
        Ok(stats)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn device_stats(&self) -> Result<Vec<DeviceStats>, DatabaseError> {
        let since = days_ago(Utc::now(), RECENT_WINDOW_DAYS);
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT device_type, COUNT(*) AS n, \
                        COALESCE(SUM(CASE WHEN status = 'SUCCESS' THEN 1 ELSE 0 END), 0) \
                 FROM game_sessions WHERE start_time >= ?1 \
                 GROUP BY device_type ORDER BY n DESC, device_type",
                [fmt_datetime(since)],
            )
            .await?;
        let mut stats = Vec::new();
        while let Some(row) = rows.next().await? {
            stats.push(DeviceStats::new(
                row.get(0)?,
                get_count(&row, 1)?,
                get_count(&row, 2)?,
            ));
        }
        Ok(stats)
    }

    /// Average time and moves of successful runs per track, fastest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn average_completion_times(&self) -> Result<Vec<TrackTimeStats>, DatabaseError> {
        let since = days_ago(Utc::now(), RECENT_WINDOW_DAYS);
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT t.name, AVG(s.execution_time_ms) AS avg_ms, AVG(s.moves_count), COUNT(*) \
                 FROM game_sessions s JOIN tracks t ON t.id = s.track_id \
                 WHERE s.start_time >= ?1 AND s.status = 'SUCCESS' \
                   AND s.execution_time_ms IS NOT NULL \
                 GROUP BY t.id, t.name ORDER BY avg_ms ASC",
                [fmt_datetime(since)],
            )
            .await?;
        let mut stats = Vec::new();
        while let Some(row) = rows.next().await? {
            stats.push(TrackTimeStats {
                track_name: row.get(0)?,
                avg_execution_time_ms: round_ms(get_avg(&row, 1)?),
                avg_moves: round2(get_avg(&row, 2)?),
                total_sessions: get_count(&row, 3)?,
            });
        }
        Ok(stats)
    }

    /// The most frequent failure messages over the recent window.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn most_common_errors(&self) -> Result<Vec<ErrorStats>, DatabaseError> {
        let since = days_ago(Utc::now(), RECENT_WINDOW_DAYS);
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT error_message, COUNT(*) AS n FROM game_sessions \
                     WHERE start_time >= ?1 AND status = 'FAILED' \
                       AND error_message IS NOT NULL AND error_message != '' \
                     GROUP BY error_message ORDER BY n DESC, error_message LIMIT {TOP_ERRORS}"
                ),
                [fmt_datetime(since)],
            )
            .await?;
        let mut stats = Vec::new();
        while let Some(row) = rows.next().await? {
            stats.push(ErrorStats {
                error_message: row.get(0)?,
                frequency: get_count(&row, 1)?,
            });
        }
        Ok(stats)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn user_audit_stats(&self) -> Result<Vec<UserAuditStats>, DatabaseError> {
        let now = Utc::now();
        self.action_stats_by_user(days_ago(now, RECENT_WINDOW_DAYS), now)
            .await
    }

    /// Totals and averages over the recent window.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn system_overview(&self) -> Result<SystemOverviewStats, DatabaseError> {
        let since = days_ago(Utc::now(), RECENT_WINDOW_DAYS);
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*), \
                        COALESCE(SUM(CASE WHEN status = 'SUCCESS' THEN 1 ELSE 0 END), 0), \
                        COALESCE(SUM(CASE WHEN status = 'FAILED' THEN 1 ELSE 0 END), 0), \
                        AVG(moves_count), AVG(execution_time_ms) \
                 FROM game_sessions WHERE start_time >= ?1",
                [fmt_datetime(since)],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(SystemOverviewStats::new(
            get_count(&row, 0)?,
            get_count(&row, 1)?,
            get_count(&row, 2)?,
            round2(get_avg(&row, 3)?),
            round_ms(get_avg(&row, 4)?),
        ))
    }

    /// Everything on the statistics page in one document.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn system_report(&self) -> Result<SystemReport, DatabaseError> {
        Ok(SystemReport {
            generated_at: Utc::now(),
            dashboard_stats: self.dashboard_stats().await?,
            daily_activity: self
                .daily_activity(u32::try_from(RECENT_WINDOW_DAYS).unwrap_or(MAX_RANGE_DAYS))
                .await?,
            track_success: self.track_success_stats().await?,
            device_stats: self.device_stats().await?,
            time_stats: self.average_completion_times().await?,
            error_stats: self.most_common_errors().await?,
            audit_stats: self.user_audit_stats().await?,
            overview_stats: self.system_overview().await?,
        })
    }

    /// Numbers shown to players on the game page.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn basic_game_stats(&self) -> Result<BasicGameStats, DatabaseError> {
        let total = self.count_sessions().await?;
        let successful = self.count_sessions_with_status("SUCCESS").await?;
        Ok(BasicGameStats {
            total_sessions_this_week: self.count_sessions_since(days_ago(Utc::now(), 7)).await?,
            successful_sessions: successful,
            available_tracks: self.count_active_tracks().await?,
            success_rate: round2(percentage(successful, total)),
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn audit_statistics(&self) -> Result<AuditStatistics, DatabaseError> {
        let now = Utc::now();
        Ok(AuditStatistics {
            today_audit_entries: self
                .count_audit_between(start_of_day(now.date_naive()), now)
                .await?,
            active_users: self
                .distinct_users_since(now - TimeDelta::hours(24))
                .await?,
            total_audit_entries: self.count_audit().await?,
            last_audit_entry: self.latest_audit().await?.map(|entry| entry.timestamp),
        })
    }

    /// The statistics page payload: totals, daily and hourly activity, per-track stats.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn complete_statistics(&self, days: u32) -> Result<CompleteStatistics, DatabaseError> {
        let now = Utc::now();
        let since = start_of_day(now.date_naive()) - TimeDelta::days(i64::from(clamp_days(days)));
        let conn = self.db().conn();

        let total_games = self.count_sessions().await?;
        let completed_games = self.count_sessions_with_status("SUCCESS").await?;

        let mut rows = conn
            .query(
                "SELECT AVG(execution_time_ms) FROM game_sessions \
                 WHERE status = 'SUCCESS' AND execution_time_ms IS NOT NULL",
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let average_time = round_ms(get_avg(&row, 0)? / 60_000.0);

        let mut rows = conn
            .query(
                "SELECT substr(start_time, 1, 10) AS day, COUNT(*) FROM game_sessions \
                 WHERE start_time >= ?1 GROUP BY day ORDER BY day",
                [fmt_datetime(since)],
            )
            .await?;
        let mut daily_activity = Vec::new();
        while let Some(row) = rows.next().await? {
            daily_activity.push(DayCount {
                date: row.get(0)?,
                games: get_count(&row, 1)?,
            });
        }

        let mut rows = conn
            .query(
                "SELECT t.name, COUNT(*) AS n, \
                        COALESCE(SUM(CASE WHEN s.status = 'SUCCESS' THEN 1 ELSE 0 END), 0), \
                        AVG(CASE WHEN s.status = 'SUCCESS' THEN s.execution_time_ms END) \
                 FROM game_sessions s JOIN tracks t ON t.id = s.track_id \
                 GROUP BY t.id, t.name ORDER BY n DESC, t.id",
                (),
            )
            .await?;
        let mut track_stats = Vec::new();
        while let Some(row) = rows.next().await? {
            let total = get_count(&row, 1)?;
            let completed = get_count(&row, 2)?;
            track_stats.push(TrackGameStats {
                track_name: row.get(0)?,
                total_games: total,
                completed_games: completed,
                success_rate: round2(percentage(completed, total)),
                average_time: round2(get_avg(&row, 3)? / 1_000.0),
            });
        }

        let mut rows = conn
            .query(
                "SELECT CAST(substr(start_time, 12, 2) AS INTEGER) AS hour, COUNT(*) \
                 FROM game_sessions WHERE start_time >= ?1 GROUP BY hour ORDER BY hour",
                [fmt_datetime(days_ago(now, 7))],
            )
            .await?;
        let mut hourly_activity = Vec::new();
        while let Some(row) = rows.next().await? {
            hourly_activity.push(HourCount {
                hour: u32::try_from(row.get::<i64>(0)?).unwrap_or(0),
                games: get_count(&row, 1)?,
            });
        }

        Ok(CompleteStatistics {
            total_games,
            completed_games,
            active_users: self.count_active_users().await?,
            average_time,
            daily_activity,
            game_status: GameStatusSplit {
                completed: completed_games,
                in_progress: total_games.saturating_sub(completed_games),
            },
            track_stats,
            hourly_activity,
        })
    }

    async fn daily_session_counts(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<BTreeMap<String, u64>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT substr(start_time, 1, 10) AS day, COUNT(*) FROM game_sessions \
                 WHERE start_time >= ?1 AND start_time <= ?2 GROUP BY day",
                libsql::params![fmt_datetime(from), fmt_datetime(to)],
            )
            .await?;
        let mut days = BTreeMap::new();
        while let Some(row) = rows.next().await? {
            days.insert(row.get::<String>(0)?, get_count(&row, 1)?);
        }
        Ok(days)
    }

    /// Zero-filled audit and game counts for each of the last `days` days,
    /// today included, labelled like `Mon 6`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn dashboard_activity(&self, days: u32) -> Result<ActivitySeries, DatabaseError> {
        let days = clamp_days(days);
        let now = Utc::now();
        let today = now.date_naive();
        let first = today - TimeDelta::days(i64::from(days) - 1);
        let from = start_of_day(first);

        let audit = self.daily_audit_activity(from, now).await?;
        let games = self.daily_session_counts(from, now).await?;

        let mut series = ActivitySeries {
            labels: Vec::new(),
            audit_activity: Vec::new(),
            game_activity: Vec::new(),
            period: format!("{days} days"),
        };
        for date in first.iter_days().take(usize::try_from(days).unwrap_or(0)) {
            let key = date.format("%Y-%m-%d").to_string();
            series.labels.push(date.format("%a %-d").to_string());
            series
                .audit_activity
                .push(audit.get(&key).copied().unwrap_or(0));
            series
                .game_activity
                .push(games.get(&key).copied().unwrap_or(0));
        }
        Ok(series)
    }
}
