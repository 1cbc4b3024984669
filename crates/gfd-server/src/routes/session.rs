//! Landing page, game page, login and logout.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;

use gfd_auth::cookie::{clear_session_cookie, session_cookie};
use gfd_core::entities::Track;
use gfd_db::error::DatabaseError;

use crate::auth::{LOGIN_PATH, session_token};
use crate::error::ApiError;
use crate::extract::{ApiQuery, ClientInfo};
use crate::html;
use crate::state::AppState;

pub const DASHBOARD_PATH: &str = "/admin/dashboard";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/game") }))
        .route("/game", get(game_page))
        .route(LOGIN_PATH, get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GamePageQuery {
    track_id: Option<i64>,
    logout: Option<bool>,
}

async fn pick_track(state: &AppState, requested: Option<i64>) -> Result<Option<Track>, ApiError> {
    if let Some(id) = requested {
        match state.service.get_active_track(id).await {
            Ok(track) => return Ok(Some(track)),
            Err(DatabaseError::NotFound { .. }) => {
                tracing::debug!(id, "requested track unavailable, picking another");
            }
            Err(other) => return Err(other.into()),
        }
    }
    Ok(state.service.random_active_track().await?)
}

async fn game_page(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GamePageQuery>,
) -> Result<Html<String>, ApiError> {
    let mut body = String::new();
    if query.logout == Some(true) {
        body.push_str("<p class=\"notice\">You have been logged out.</p>\n");
    }
    match pick_track(&state, query.track_id).await? {
        Some(track) => {
            body.push_str(&format!(
                "<h2>{}</h2>\n<p>Difficulty {}</p>\n",
                html::escape(&track.name),
                track.difficulty_level
            ));
            if let Some(ref description) = track.description {
                body.push_str(&format!("<p>{}</p>\n", html::escape(description)));
            }
            body.push_str(&html::grid_preview(&track));
            body.push('\n');
            body.push_str(&html::json_script("track-data", &track));
        }
        None => body.push_str("<p>No tracks available</p>"),
    }
    Ok(html::page("Game for Devs", None, &body))
}

#[derive(Debug, Default, Deserialize)]
struct LoginPageQuery {
    error: Option<bool>,
    logout: Option<bool>,
}

async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<LoginPageQuery>,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers, state.cookie_name()) {
        if state.service.resolve_session(&token).await?.is_some() {
            return Ok(Redirect::to(DASHBOARD_PATH).into_response());
        }
    }

    let mut body = String::new();
    if query.error == Some(true) {
        body.push_str("<p class=\"error\">Invalid username or password</p>\n");
    }
    if query.logout == Some(true) {
        body.push_str("<p class=\"notice\">You have been logged out.</p>\n");
    }
    body.push_str(concat!(
        "<form method=\"post\" action=\"/login\">\n",
        "<label>Username <input name=\"username\" autocomplete=\"username\" required></label>\n",
        "<label>Password <input name=\"password\" type=\"password\" autocomplete=\"current-password\" required></label>\n",
        "<button type=\"submit\">Sign in</button>\n",
        "</form>"
    ));
    Ok(html::page("Sign in", None, &body).into_response())
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let ttl = state.session_ttl();
    match state
        .service
        .login(&form.username, &form.password, ttl, &client.anonymous())
        .await
    {
        Ok((_, session)) => {
            let cookie = session_cookie(
                state.cookie_name(),
                &session.token,
                ttl,
                state.config.auth.secure_cookie,
            );
            Ok(([(SET_COOKIE, cookie)], Redirect::to(DASHBOARD_PATH)).into_response())
        }
        Err(DatabaseError::Auth(_)) => Ok(Redirect::to("/login?error=true").into_response()),
        Err(other) => Err(other.into()),
    }
}

async fn logout(
    State(state): State<AppState>,
    client: ClientInfo,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers, state.cookie_name()) {
        state.service.logout(&token, &client.anonymous()).await?;
    }
    let cookie = clear_session_cookie(state.cookie_name(), state.config.auth.secure_cookie);
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/game?logout=true")).into_response())
}
