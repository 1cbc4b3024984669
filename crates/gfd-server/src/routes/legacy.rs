//! Track lookups kept for the first web client, under `/api/track`.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use gfd_core::entities::Track;

use crate::error::ApiError;
use crate::routes::game::NO_TRACKS;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/random", get(random_track))
        .route("/{id}", get(active_track))
}

async fn random_track(State(state): State<AppState>) -> Result<Json<Track>, ApiError> {
    state
        .service
        .random_active_track()
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(NO_TRACKS.into()))
}

async fn active_track(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Track>, ApiError> {
    Ok(Json(state.service.get_active_track(id).await?))
}
