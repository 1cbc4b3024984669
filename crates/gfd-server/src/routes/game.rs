//! Public game API under `/api/game`.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use gfd_core::robot::{Move, RunOutcome};
use gfd_core::stats::{BasicGameStats, SessionTotals};
use gfd_db::updates::game_session::GameSessionUpdate;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery, ClientInfo};
use crate::state::AppState;

pub const NO_TRACKS: &str = "No tracks available";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tracks/debug", get(tracks_debug))
        .route("/track/random", get(random_track))
        .route("/session/start", post(start_session))
        .route("/session/{session_id}", get(get_session).put(update_session))
        .route("/run", post(run_program))
        .route("/stats/basic", get(basic_stats))
        // Older clients report a finished game in one request.
        .route("/session", post(record_quick_session))
        .route("/stats", get(session_totals))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackSummary {
    id: i64,
    name: String,
    is_active: bool,
}

async fn tracks_debug(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let tracks = state.service.all_tracks().await?;
    let active = tracks.iter().filter(|t| t.is_active).count();
    let summaries: Vec<TrackSummary> = tracks
        .into_iter()
        .map(|t| TrackSummary {
            id: t.id,
            name: t.name,
            is_active: t.is_active,
        })
        .collect();
    Ok(Json(json!({
        "totalTracks": summaries.len(),
        "activeTracks": active,
        "tracks": summaries,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RandomTrackQuery {
    exclude_id: Option<i64>,
}

async fn random_track(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RandomTrackQuery>,
) -> Result<Json<Value>, ApiError> {
    let track = match query.exclude_id {
        Some(excluded) => state.service.random_active_track_excluding(excluded).await?,
        None => state.service.random_active_track().await?,
    }
    .ok_or_else(|| ApiError::NotFound(NO_TRACKS.into()))?;

    let mut body = serde_json::to_value(&track).map_err(|e| ApiError::Internal(e.to_string()))?;
    if let (Some(excluded), Value::Object(map)) = (query.exclude_id, &mut body) {
        map.insert("isDifferent".into(), Value::Bool(track.id != excluded));
        map.insert("excludedId".into(), Value::from(excluded));
    }
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartSession {
    track_id: i64,
    #[serde(default)]
    screen_resolution: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionStarted {
    session_id: String,
    track_id: i64,
    total_cells_required: i64,
    message: &'static str,
}

async fn start_session(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(body): ApiJson<StartSession>,
) -> Result<Json<SessionStarted>, ApiError> {
    let session = state
        .service
        .start_session(body.track_id, client.into_session_client(body.screen_resolution))
        .await?;
    Ok(Json(SessionStarted {
        session_id: session.session_id,
        track_id: session.track_id,
        total_cells_required: session.total_cells_required,
        message: "Session started successfully",
    }))
}

async fn update_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ApiJson(update): ApiJson<GameSessionUpdate>,
) -> Result<Json<Value>, ApiError> {
    let session = state.service.update_session(&session_id, update).await?;
    Ok(Json(json!({
        "message": "Session updated successfully",
        "sessionId": session.session_id,
    })))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = state.service.get_session(&session_id).await?;
    let completion = session.completion_percentage();
    let mut body =
        serde_json::to_value(&session).map_err(|e| ApiError::Internal(e.to_string()))?;
    if let Value::Object(ref mut map) = body {
        map.insert("completionPercentage".into(), Value::from(completion));
    }
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunProgram {
    track_id: i64,
    moves: Vec<Move>,
}

async fn run_program(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RunProgram>,
) -> Result<Json<RunOutcome>, ApiError> {
    Ok(Json(
        state.service.run_program(body.track_id, &body.moves).await?,
    ))
}

async fn basic_stats(State(state): State<AppState>) -> Result<Json<BasicGameStats>, ApiError> {
    Ok(Json(state.service.basic_game_stats().await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuickSession {
    track_id: i64,
    #[serde(default)]
    completed: bool,
    /// Seconds.
    #[serde(default)]
    time_spent: i64,
    #[serde(default)]
    moves: i64,
}

async fn record_quick_session(
    State(state): State<AppState>,
    client: ClientInfo,
    ApiJson(body): ApiJson<QuickSession>,
) -> Result<Json<Value>, ApiError> {
    let session = state
        .service
        .record_quick_session(
            body.track_id,
            body.completed,
            body.time_spent,
            body.moves,
            client.into_session_client(None),
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "sessionId": session.session_id,
        "message": "Game session saved successfully",
    })))
}

async fn session_totals(State(state): State<AppState>) -> Result<Json<SessionTotals>, ApiError> {
    Ok(Json(state.service.session_totals().await?))
}
