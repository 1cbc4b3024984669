use axum::extract::{Path, State};
use axum::http::header::CONTENT_DISPOSITION;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use gfd_core::entities::Track;
use gfd_core::enums::Direction;
use gfd_core::paging::Page;
use gfd_core::stats::TrackStats;
use gfd_core::transfer::TrackExport;
use gfd_db::repos::track::NewTrack;
use gfd_db::updates::track::TrackUpdate;

use crate::error::ApiError;
use crate::extract::{Admin, ApiJson, ApiQuery};
use crate::query::PageParams;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tracks", get(list_tracks).post(create_track))
        .route("/tracks/search", get(search_tracks))
        .route("/tracks/stats", get(track_stats))
        .route("/tracks/export", get(export_tracks))
        .route("/tracks/import", post(import_track))
        .route(
            "/tracks/{id}",
            get(get_track).put(update_track).delete(delete_track),
        )
        .route("/tracks/{id}/reactivate", post(reactivate_track))
        .route("/tracks/{id}/export", get(export_track))
}

/// `attachment` disposition with a filename safe for the header.
fn attachment(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

async fn list_tracks(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<Track>>, ApiError> {
    let general = &state.config.general;
    Ok(Json(
        state
            .service
            .list_tracks(&params.to_request(general.default_page_size, general))
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    #[serde(default)]
    search_term: String,
}

async fn search_tracks(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<Track>>, ApiError> {
    Ok(Json(state.service.search_tracks(&query.search_term).await?))
}

async fn get_track(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<Track>, ApiError> {
    Ok(Json(state.service.get_track(id).await?))
}

async fn create_track(
    State(state): State<AppState>,
    admin: Admin,
    ApiJson(body): ApiJson<NewTrack>,
) -> Result<Json<Track>, ApiError> {
    Ok(Json(state.service.create_track(body, &admin.ctx).await?))
}

/// Partial track edit. A blank `description` clears it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditTrack {
    name: Option<String>,
    grid_config: Option<String>,
    start_x: Option<i32>,
    start_y: Option<i32>,
    start_direction: Option<Direction>,
    difficulty_level: Option<i32>,
    description: Option<String>,
    is_active: Option<bool>,
}

impl From<EditTrack> for TrackUpdate {
    fn from(edit: EditTrack) -> Self {
        Self {
            name: edit.name,
            grid_config: edit.grid_config,
            start_x: edit.start_x,
            start_y: edit.start_y,
            start_direction: edit.start_direction,
            difficulty_level: edit.difficulty_level,
            description: edit.description.map(Some),
            is_active: edit.is_active,
        }
    }
}

async fn update_track(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<EditTrack>,
) -> Result<Json<Track>, ApiError> {
    Ok(Json(
        state
            .service
            .update_track(id, body.into(), &admin.ctx)
            .await?,
    ))
}

async fn delete_track(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.service.delete_track(id, &admin.ctx).await?;
    Ok(Json(json!({ "message": "Track deleted successfully" })))
}

async fn reactivate_track(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<Track>, ApiError> {
    Ok(Json(state.service.reactivate_track(id, &admin.ctx).await?))
}

async fn export_track(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let doc = state.service.export_track(id, &admin.ctx).await?;
    let disposition = attachment(&format!("track_{}.json", doc.name));
    Ok(([(CONTENT_DISPOSITION, disposition)], Json(doc)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportQuery {
    #[serde(default = "default_active_only")]
    active_only: bool,
}

const fn default_active_only() -> bool {
    true
}

async fn export_tracks(
    State(state): State<AppState>,
    admin: Admin,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<Response, ApiError> {
    let docs: Vec<TrackExport> = state
        .service
        .export_tracks(query.active_only, &admin.ctx)
        .await?;
    Ok(([(CONTENT_DISPOSITION, attachment("tracks.json"))], Json(docs)).into_response())
}

async fn import_track(
    State(state): State<AppState>,
    admin: Admin,
    ApiJson(doc): ApiJson<TrackExport>,
) -> Result<Json<Track>, ApiError> {
    Ok(Json(state.service.import_track(doc, &admin.ctx).await?))
}

async fn track_stats(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<TrackStats>, ApiError> {
    Ok(Json(state.service.track_stats().await?))
}
