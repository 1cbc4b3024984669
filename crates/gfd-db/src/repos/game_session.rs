//! Game session repository.
//!
//! Sessions are created by anonymous players through the public game API and
//! are never audited. Status moves along the state machine in
//! [`GameStatus::allowed_next_states`].

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;

use gfd_core::entities::GameSession;
use gfd_core::enums::{DeviceType, GameStatus};
use gfd_core::paging::{Page, PageRequest};
use gfd_core::robot::{Move, Position, RunOutcome, simulate};
use gfd_core::stats::{SessionTotals, percentage, round2};

use crate::error::DatabaseError;
use crate::helpers::{
    fmt_datetime, get_count, get_opt_i32, get_opt_string, parse_datetime, parse_enum,
    parse_optional_datetime,
};
use crate::service::GameService;
use crate::updates::game_session::GameSessionUpdate;

const SELECT_COLS: &str = "id, session_id, track_id, start_time, end_time, status, moves_count, \
     execution_time_ms, error_position_x, error_position_y, error_message, ip_address, \
     user_agent, screen_resolution, device_type, moves_sequence, attempts_count, \
     cells_visited, total_cells_required";

/// Prefix of ids minted by the legacy one-shot endpoint.
pub const QUICK_SESSION_PREFIX: &str = "web_";

/// Longest play time the legacy endpoint accepts: one day.
pub const MAX_QUICK_SESSION_SECS: i64 = 24 * 60 * 60;

fn row_to_session(row: &libsql::Row) -> Result<GameSession, DatabaseError> {
    Ok(GameSession {
        id: row.get(0)?,
        session_id: row.get(1)?,
        track_id: row.get(2)?,
        start_time: parse_datetime(&row.get::<String>(3)?)?,
        end_time: parse_optional_datetime(get_opt_string(row, 4)?.as_deref())?,
        status: parse_enum(&row.get::<String>(5)?)?,
        moves_count: row.get(6)?,
        execution_time_ms: row.get::<Option<i64>>(7)?,
        error_position_x: get_opt_i32(row, 8)?,
        error_position_y: get_opt_i32(row, 9)?,
        error_message: get_opt_string(row, 10)?,
        ip_address: get_opt_string(row, 11)?,
        user_agent: get_opt_string(row, 12)?,
        screen_resolution: get_opt_string(row, 13)?,
        device_type: parse_enum(&row.get::<String>(14)?)?,
        moves_sequence: get_opt_string(row, 15)?,
        attempts_count: row.get(16)?,
        cells_visited: row.get(17)?,
        total_cells_required: row.get(18)?,
    })
}

/// Where a player connected from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClient {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub screen_resolution: Option<String>,
}

/// Filter criteria for session listings. All fields combine with AND.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub status: Option<GameStatus>,
    pub track_id: Option<i64>,
    pub device_type: Option<DeviceType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SessionFilter {
    fn where_clause(&self) -> (String, Vec<libsql::Value>) {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(status) = self.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(track_id) = self.track_id {
            params.push(track_id.into());
            conditions.push(format!("track_id = ?{}", params.len()));
        }
        if let Some(device_type) = self.device_type {
            params.push(device_type.as_str().into());
            conditions.push(format!("device_type = ?{}", params.len()));
        }
        if let Some(from) = self.from {
            params.push(fmt_datetime(from).into());
            conditions.push(format!("start_time >= ?{}", params.len()));
        }
        if let Some(to) = self.to {
            params.push(fmt_datetime(to).into());
            conditions.push(format!("start_time <= ?{}", params.len()));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!(" WHERE {}", conditions.join(" AND ")), params)
        }
    }
}

fn session_params(session: &GameSession) -> Vec<libsql::Value> {
    vec![
        session.session_id.clone().into(),
        session.track_id.into(),
        fmt_datetime(session.start_time).into(),
        session.end_time.map(fmt_datetime).into(),
        session.status.as_str().into(),
        session.moves_count.into(),
        session.execution_time_ms.into(),
        session.error_position_x.map(i64::from).into(),
        session.error_position_y.map(i64::from).into(),
        session.error_message.clone().into(),
        session.ip_address.clone().into(),
        session.user_agent.clone().into(),
        session.screen_resolution.clone().into(),
        session.device_type.as_str().into(),
        session.moves_sequence.clone().into(),
        session.attempts_count.into(),
        session.cells_visited.into(),
        session.total_cells_required.into(),
    ]
}

impl GameService {
    async fn insert_session(&self, session: &GameSession) -> Result<GameSession, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "INSERT INTO game_sessions (session_id, track_id, start_time, end_time, \
                     status, moves_count, execution_time_ms, error_position_x, error_position_y, \
                     error_message, ip_address, user_agent, screen_resolution, device_type, \
                     moves_sequence, attempts_count, cells_visited, total_cells_required)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                     ?16, ?17, ?18)
                     RETURNING {SELECT_COLS}"
                ),
                libsql::params_from_iter(session_params(session)),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_session(&row)
    }

    /// Open an IN_PROGRESS session on an existing track.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the track does not exist.
    pub async fn start_session(
        &self,
        track_id: i64,
        client: SessionClient,
    ) -> Result<GameSession, DatabaseError> {
        let track = self.get_track(track_id).await?;
        let total_cells = i64::try_from(track.grid()?.path_cell_count()).unwrap_or(i64::MAX);
        let device_type = DeviceType::detect(client.user_agent.as_deref());

        let session = self
            .insert_session(&GameSession {
                id: 0,
                session_id: Uuid::new_v4().to_string(),
                track_id,
                start_time: Utc::now(),
                end_time: None,
                status: GameStatus::InProgress,
                moves_count: 0,
                execution_time_ms: None,
                error_position_x: None,
                error_position_y: None,
                error_message: None,
                ip_address: client.ip_address,
                user_agent: client.user_agent,
                screen_resolution: client.screen_resolution,
                device_type,
                moves_sequence: None,
                attempts_count: 1,
                cells_visited: 0,
                total_cells_required: total_cells,
            })
            .await?;
        tracing::debug!(
            session_id = %session.session_id,
            track_id,
            device = %device_type,
            "game session started"
        );
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no session has this id.
    pub async fn get_session(&self, session_id: &str) -> Result<GameSession, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM game_sessions WHERE session_id = ?1"),
                [session_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Game session", session_id))?;
        row_to_session(&row)
    }

    /// Apply a progress report from the client.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for negative counters,
    /// `DatabaseError::NotFound` for an unknown session and
    /// `DatabaseError::InvalidState` for a forbidden status change.
    pub async fn update_session(
        &self,
        session_id: &str,
        update: GameSessionUpdate,
    ) -> Result<GameSession, DatabaseError> {
        update.validate()?;
        let mut session = self.get_session(session_id).await?;

        if let Some(moves) = update.moves_count {
            session.moves_count = moves;
        }
        if let Some(sequence) = update.moves_sequence {
            session.moves_sequence = Some(sequence);
        }
        if let Some(cells) = update.cells_visited {
            session.cells_visited = cells;
        }
        if let Some(attempts) = update.attempts_count {
            session.attempts_count = attempts;
        }
        if let Some(resolution) = update.screen_resolution {
            session.screen_resolution = Some(resolution);
        }
        if let Some(status) = update.status {
            let was = session.status;
            session.transition_to(status, Utc::now())?;
            if was != status && status.ends_session() {
                if let Some(ms) = update.execution_time_ms {
                    session.execution_time_ms = Some(ms);
                }
            }
            if was != status && status == GameStatus::Failed {
                session.error_message = update.error_message;
                session.error_position_x = update.error_position_x;
                session.error_position_y = update.error_position_y;
            }
        }

        let mut params = session_params(&session);
        params.remove(0);
        params.push(session.session_id.clone().into());
        self.db()
            .conn()
            .execute(
                "UPDATE game_sessions SET track_id = ?1, start_time = ?2, end_time = ?3, \
                 status = ?4, moves_count = ?5, execution_time_ms = ?6, error_position_x = ?7, \
                 error_position_y = ?8, error_message = ?9, ip_address = ?10, user_agent = ?11, \
                 screen_resolution = ?12, device_type = ?13, moves_sequence = ?14, \
                 attempts_count = ?15, cells_visited = ?16, total_cells_required = ?17 \
                 WHERE session_id = ?18",
                libsql::params_from_iter(params),
            )
            .await?;

        tracing::debug!(session_id, status = %session.status, "game session updated");
        self.get_session(session_id).await
    }

    /// One page of sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_sessions(
        &self,
        filter: &SessionFilter,
        page: &PageRequest,
    ) -> Result<Page<GameSession>, DatabaseError> {
        let (where_clause, params) = filter.where_clause();
        let total = self
            .query_count(
                &format!("SELECT COUNT(*) FROM game_sessions{where_clause}"),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        let sessions = self
            .collect_sessions(
                &format!(
                    "SELECT {SELECT_COLS} FROM game_sessions{where_clause} \
                     ORDER BY start_time DESC, id DESC LIMIT {} OFFSET {}",
                    page.size,
                    page.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(Page::new(sessions, page, total))
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn recent_sessions(&self, limit: u32) -> Result<Vec<GameSession>, DatabaseError> {
        self.collect_sessions(
            &format!(
                "SELECT {SELECT_COLS} FROM game_sessions ORDER BY start_time DESC, id DESC LIMIT ?1"
            ),
            [i64::from(limit)],
        )
        .await
    }

    async fn collect_sessions(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<GameSession>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }

    /// Record a finished game in one call, for the legacy endpoint.
    ///
    /// `time_spent_secs` is how long the player took; the session is back-dated
    /// by that much. Completed games are SUCCESS, others ABANDONED.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the track does not exist and
    /// `DatabaseError::Validation` if `time_spent_secs` exceeds
    /// [`MAX_QUICK_SESSION_SECS`].
    pub async fn record_quick_session(
        &self,
        track_id: i64,
        completed: bool,
        time_spent_secs: i64,
        moves: i64,
        client: SessionClient,
    ) -> Result<GameSession, DatabaseError> {
        let time_spent_secs = time_spent_secs.max(0);
        if time_spent_secs > MAX_QUICK_SESSION_SECS {
            return Err(DatabaseError::Validation(format!(
                "Time spent must not exceed {MAX_QUICK_SESSION_SECS} seconds"
            )));
        }
        let track = self.get_track(track_id).await?;
        let total_cells = i64::try_from(track.grid()?.path_cell_count()).unwrap_or(i64::MAX);
        let now = Utc::now();
        let start_time = TimeDelta::try_seconds(time_spent_secs)
            .and_then(|spent| now.checked_sub_signed(spent))
            .ok_or_else(|| DatabaseError::Validation("Time spent is out of range".into()))?;

        let mut millis = now.timestamp_millis();
        let session_id = loop {
            let candidate = format!("{QUICK_SESSION_PREFIX}{millis}");
            let taken = self
                .query_count(
                    "SELECT COUNT(*) FROM game_sessions WHERE session_id = ?1",
                    [candidate.as_str()],
                )
                .await?;
            if taken == 0 {
                break candidate;
            }
            millis += 1;
        };

        let device_type = DeviceType::detect(client.user_agent.as_deref());
        self.insert_session(&GameSession {
            id: 0,
            session_id,
            track_id,
            start_time,
            end_time: Some(now),
            status: if completed {
                GameStatus::Success
            } else {
                GameStatus::Abandoned
            },
            moves_count: moves.max(0),
            execution_time_ms: Some(time_spent_secs.saturating_mul(1000)),
            error_position_x: None,
            error_position_y: None,
            error_message: None,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
            screen_resolution: client.screen_resolution,
            device_type,
            moves_sequence: None,
            attempts_count: 1,
            cells_visited: if completed { total_cells } else { 0 },
            total_cells_required: total_cells,
        })
        .await
    }

    /// Simulate a move program on an active track.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for a missing or inactive track and
    /// `Validation` for an oversized program.
    pub async fn run_program(
        &self,
        track_id: i64,
        moves: &[Move],
    ) -> Result<RunOutcome, DatabaseError> {
        let track = self.get_active_track(track_id).await?;
        let grid = track.grid()?;
        Ok(simulate(
            &grid,
            Position::new(track.start_x, track.start_y),
            track.start_direction,
            moves,
        )?)
    }

    /// All-time session count, SUCCESS count and their ratio in percent.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn session_totals(&self) -> Result<SessionTotals, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT COUNT(*), \
                        COALESCE(SUM(CASE WHEN status = 'SUCCESS' THEN 1 ELSE 0 END), 0) \
                 FROM game_sessions",
                (),
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let total_sessions = get_count(&row, 0)?;
        let completed_sessions = get_count(&row, 1)?;
        Ok(SessionTotals {
            total_sessions,
            completed_sessions,
            completion_rate: round2(percentage(completed_sessions, total_sessions)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{seed_track, test_service};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn phone() -> SessionClient {
        SessionClient {
            ip_address: Some("203.0.113.9".into()),
            user_agent: Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)".into()),
            screen_resolution: Some("390x844".into()),
        }
    }

    #[tokio::test]
    async fn start_session_counts_path_cells() {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let session = svc.start_session(track_id, phone()).await.unwrap();

        assert_eq!(session.status, GameStatus::InProgress);
        assert_eq!(session.total_cells_required, 7);
        assert_eq!(session.device_type, DeviceType::Mobile);
        assert_eq!(session.attempts_count, 1);
        assert!(Uuid::parse_str(&session.session_id).is_ok());
        assert_eq!(svc.get_session(&session.session_id).await.unwrap(), session);
    }

    #[tokio::test]
    async fn start_session_on_missing_track_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .start_session(42, SessionClient::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn success_stamps_end_and_execution_time() {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let session = svc
            .start_session(track_id, SessionClient::default())
            .await
            .unwrap();

        let update = GameSessionUpdate {
            status: Some(GameStatus::Success),
            moves_count: Some(8),
            cells_visited: Some(7),
            execution_time_ms: Some(4_200),
            ..GameSessionUpdate::default()
        };
        let done = svc.update_session(&session.session_id, update).await.unwrap();
        assert_eq!(done.status, GameStatus::Success);
        assert!(done.end_time.is_some());
        assert_eq!(done.execution_time_ms, Some(4_200));
        assert!((done.completion_percentage() - 100.0).abs() < f64::EPSILON);

        let stored = svc.get_session(&session.session_id).await.unwrap();
        assert_eq!(stored, done);
    }

    #[tokio::test]
    async fn failure_records_error_details() {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let session = svc
            .start_session(track_id, SessionClient::default())
            .await
            .unwrap();

        let update = GameSessionUpdate {
            status: Some(GameStatus::Failed),
            error_message: Some("wall".into()),
            error_position_x: Some(3),
            error_position_y: Some(0),
            ..GameSessionUpdate::default()
        };
        let failed = svc.update_session(&session.session_id, update).await.unwrap();
        assert_eq!(failed.error_message.as_deref(), Some("wall"));
        assert_eq!(failed.error_position_x, Some(3));
        assert!(failed.end_time.is_some());
    }

    #[rstest]
    #[case(GameStatus::Success, GameStatus::Failed)]
    #[case(GameStatus::Failed, GameStatus::InProgress)]
    #[case(GameStatus::Abandoned, GameStatus::Success)]
    #[tokio::test]
    async fn finished_sessions_reject_new_status(
        #[case] first: GameStatus,
        #[case] second: GameStatus,
    ) {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let session = svc
            .start_session(track_id, SessionClient::default())
            .await
            .unwrap();
        let to = |status| GameSessionUpdate {
            status: Some(status),
            ..GameSessionUpdate::default()
        };
        svc.update_session(&session.session_id, to(first))
            .await
            .unwrap();
        let err = svc
            .update_session(&session.session_id, to(second))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }

    #[tokio::test]
    async fn progress_update_keeps_status() {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let session = svc
            .start_session(track_id, SessionClient::default())
            .await
            .unwrap();
        let update = GameSessionUpdate {
            moves_count: Some(3),
            attempts_count: Some(2),
            moves_sequence: Some("[\"FORWARD\"]".into()),
            ..GameSessionUpdate::default()
        };
        let updated = svc.update_session(&session.session_id, update).await.unwrap();
        assert_eq!(updated.status, GameStatus::InProgress);
        assert_eq!(updated.attempts_count, 2);
        assert!(updated.end_time.is_none());
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let svc = test_service().await;
        let err = svc
            .update_session("missing", GameSessionUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Game session not found with id: missing");
    }

    #[tokio::test]
    async fn quick_sessions_feed_totals() {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;

        let won = svc
            .record_quick_session(track_id, true, 30, 9, phone())
            .await
            .unwrap();
        assert!(won.session_id.starts_with(QUICK_SESSION_PREFIX));
        assert_eq!(won.status, GameStatus::Success);
        assert_eq!(won.execution_time_ms, Some(30_000));
        assert_eq!(won.duration_ms(), Some(30_000));

        let quit = svc
            .record_quick_session(track_id, false, 5, 2, SessionClient::default())
            .await
            .unwrap();
        assert_ne!(quit.session_id, won.session_id);
        assert_eq!(quit.status, GameStatus::Abandoned);
        svc.record_quick_session(track_id, false, 5, 2, SessionClient::default())
            .await
            .unwrap();

        let totals = svc.session_totals().await.unwrap();
        assert_eq!(totals.total_sessions, 3);
        assert_eq!(totals.completed_sessions, 1);
        assert!((totals.completion_rate - 33.33).abs() < f64::EPSILON);
    }

    #[rstest]
    #[case(MAX_QUICK_SESSION_SECS + 1)]
    #[case(10_000_000_000_000)]
    #[case(i64::MAX)]
    #[tokio::test]
    async fn quick_session_rejects_absurd_play_time(#[case] secs: i64) {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let err = svc
            .record_quick_session(track_id, true, secs, 9, SessionClient::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert_eq!(svc.session_totals().await.unwrap().total_sessions, 0);
    }

    #[tokio::test]
    async fn quick_session_accepts_a_full_day() {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let session = svc
            .record_quick_session(track_id, true, MAX_QUICK_SESSION_SECS, 9, SessionClient::default())
            .await
            .unwrap();
        assert_eq!(session.duration_ms(), Some(MAX_QUICK_SESSION_SECS * 1000));
    }

    #[rstest]
    #[case(GameSessionUpdate { moves_count: Some(-1), ..GameSessionUpdate::default() })]
    #[case(GameSessionUpdate { cells_visited: Some(-3), ..GameSessionUpdate::default() })]
    #[case(GameSessionUpdate { attempts_count: Some(-2), ..GameSessionUpdate::default() })]
    #[tokio::test]
    async fn negative_counters_are_rejected(#[case] update: GameSessionUpdate) {
        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let session = svc
            .start_session(track_id, SessionClient::default())
            .await
            .unwrap();

        let err = svc
            .update_session(&session.session_id, update)
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let stored = svc.get_session(&session.session_id).await.unwrap();
        assert_eq!(stored.moves_count, 0);
        assert_eq!(stored.cells_visited, 0);
        assert_eq!(stored.attempts_count, 1);
    }

    #[tokio::test]
    async fn list_sessions_filters_and_pages() {
        let svc = test_service().await;
        let a = seed_track(&svc, "A").await;
        let b = seed_track(&svc, "B").await;
        svc.start_session(a, phone()).await.unwrap();
        svc.start_session(a, SessionClient::default()).await.unwrap();
        svc.start_session(b, phone()).await.unwrap();

        let filter = SessionFilter {
            device_type: Some(DeviceType::Mobile),
            ..SessionFilter::default()
        };
        let page = svc
            .list_sessions(&filter, &PageRequest::new(0, 1))
            .await
            .unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].track_id, b);

        let filter = SessionFilter {
            track_id: Some(a),
            ..SessionFilter::default()
        };
        let page = svc
            .list_sessions(&filter, &PageRequest::new(0, 10))
            .await
            .unwrap();
        assert_eq!(page.total_elements, 2);
        assert_eq!(svc.recent_sessions(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn run_program_uses_track_start_pose() {
        use Move::{Forward, Right};

        let svc = test_service().await;
        let track_id = seed_track(&svc, "L").await;
        let outcome = svc
            .run_program(
                track_id,
                &[Forward, Forward, Right, Forward, Forward, Move::Left, Forward, Forward],
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, gfd_core::robot::RunStatus::Success);
        assert_eq!(outcome.cells_visited, 7);

        let blocked = svc.run_program(track_id, &[Right, Forward]).await.unwrap();
        assert_eq!(blocked.status, gfd_core::robot::RunStatus::Failed);
        assert_eq!(blocked.error_position, Some(Position::new(0, 1)));
    }
}
