//! Shared helpers for router tests.
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use gfd_config::GameConfig;
use gfd_core::entities::Track;
use gfd_core::enums::{Direction, Role};
use gfd_db::repos::track::NewTrack;
use gfd_db::repos::user::NewUser;
use gfd_db::service::{ActionContext, GameService};
use gfd_server::{AppState, app};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "secret123";

/// 1 1 1 0 0
/// 0 0 1 0 0
/// 0 0 1 1 1
/// 0 0 0 0 0
pub const L_GRID: &str = "[[1,1,1,0,0],[0,0,1,0,0],[0,0,1,1,1],[0,0,0,0,0]]";

/// In-memory store with one admin account.
pub async fn test_state() -> AppState {
    let service = GameService::new_local(":memory:", None)
        .await
        .unwrap()
        .with_bcrypt_cost(4);
    service
        .create_user(
            NewUser {
                username: ADMIN_USERNAME.into(),
                email: "admin@example.com".into(),
                password: ADMIN_PASSWORD.into(),
                full_name: Some("Site Admin".into()),
                role: Role::Admin,
                is_active: true,
            },
            &ActionContext::system(),
        )
        .await
        .unwrap();
    AppState::new(service, GameConfig::default())
}

pub async fn seed_track(state: &AppState, name: &str) -> Track {
    state
        .service
        .create_track(
            NewTrack {
                name: name.into(),
                grid_config: L_GRID.into(),
                start_x: 0,
                start_y: 0,
                start_direction: Direction::East,
                difficulty_level: Some(2),
                description: None,
            },
            &ActionContext::user(ADMIN_USERNAME),
        )
        .await
        .unwrap()
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    res.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn json_body(res: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(res).await).unwrap()
}

pub async fn text_body(res: Response<Body>) -> String {
    String::from_utf8(body_bytes(res).await).unwrap()
}

pub fn header<'a>(res: &'a Response<Body>, name: &str) -> &'a str {
    res.headers()
        .get(name)
        .map(|v| v.to_str().unwrap())
        .unwrap_or_default()
}

pub async fn post_login(app: &Router, username: &str, password: &str) -> Response<Body> {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

/// Sign in as the seeded admin and return the `Cookie` header value.
pub async fn login(app: &Router) -> String {
    let res = post_login(app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let set_cookie = header(&res, "set-cookie");
    set_cookie.split(';').next().unwrap().to_string()
}

/// A router plus an admin session cookie.
pub async fn admin_app() -> (Router, AppState, String) {
    let state = test_state().await;
    let router = app(state.clone());
    let cookie = login(&router).await;
    (router, state, cookie)
}
