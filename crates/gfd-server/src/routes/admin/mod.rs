//! Admin JSON API, mounted under `/api/admin` behind [`crate::auth::require_admin`].

mod audit;
mod statistics;
mod tracks;
mod users;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(tracks::router())
        .merge(audit::router())
        .merge(statistics::router())
}
