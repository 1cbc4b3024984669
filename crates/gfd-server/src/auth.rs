//! Session-cookie gate for the admin area.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::COOKIE;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use gfd_auth::cookie::find_cookie;

use crate::error::ApiError;
use crate::state::AppState;

pub const LOGIN_PATH: &str = "/login";

/// The session token carried by the request, if any.
#[must_use]
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| find_cookie(header, cookie_name))
        .map(str::to_string)
}

fn unauthenticated(path: &str) -> Response {
    if path.starts_with("/api/") {
        ApiError::Unauthorized.into_response()
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// Admit requests whose session resolves to an admin.
///
/// The resolved [`gfd_auth::Principal`] is inserted into request extensions
/// for [`crate::extract::Admin`].
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = session_token(req.headers(), state.cookie_name()) else {
        return unauthenticated(req.uri().path());
    };

    match state.service.resolve_session(&token).await {
        Ok(Some(principal)) if principal.can_access_admin() => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Ok(Some(principal)) => {
            tracing::warn!(
                username = %principal.username,
                path = req.uri().path(),
                "admin area denied"
            );
            ApiError::Forbidden.into_response()
        }
        Ok(None) => unauthenticated(req.uri().path()),
        Err(error) => ApiError::from(error).into_response(),
    }
}
