mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{get, json_body, seed_track, send, test_state};
use gfd_server::app;

#[tokio::test]
async fn random_track_without_tracks_is_404() {
    let app = app(test_state().await);

    let res = get(&app, "/api/game/track/random").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await, json!({"error": "No tracks available"}));

    let res = get(&app, "/api/track/random").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn random_track_excluding_reports_difference() {
    let state = test_state().await;
    let first = seed_track(&state, "First").await;
    let second = seed_track(&state, "Second").await;
    let app = app(state);

    let res = get(&app, &format!("/api/game/track/random?excludeId={}", first.id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["id"], second.id);
    assert_eq!(body["isDifferent"], true);
    assert_eq!(body["excludedId"], first.id);
    assert_eq!(body["startDirection"], "EAST");
}

#[tokio::test]
async fn tracks_debug_counts_active() {
    let state = test_state().await;
    seed_track(&state, "Kept").await;
    let gone = seed_track(&state, "Gone").await;
    state
        .service
        .delete_track(gone.id, &gfd_db::service::ActionContext::user("admin"))
        .await
        .unwrap();
    let app = app(state);

    let body = json_body(get(&app, "/api/game/tracks/debug").await).await;
    assert_eq!(body["totalTracks"], 2);
    assert_eq!(body["activeTracks"], 1);
    assert_eq!(body["tracks"][1], json!({"id": gone.id, "name": "Gone", "isActive": false}));
}

#[tokio::test]
async fn session_lifecycle() {
    let state = test_state().await;
    let track = seed_track(&state, "Lifecycle").await;
    let app = app(state);

    let res = send(
        &app,
        Method::POST,
        "/api/game/session/start",
        None,
        Some(json!({"trackId": track.id, "screenResolution": "1920x1080"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let started = json_body(res).await;
    assert_eq!(started["totalCellsRequired"], 7);
    let session_id = started["sessionId"].as_str().unwrap().to_string();

    let res = send(
        &app,
        Method::PUT,
        &format!("/api/game/session/{session_id}"),
        None,
        Some(json!({"cellsVisited": 7, "movesCount": 6, "status": "SUCCESS", "executionTimeMs": 4200})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["sessionId"], session_id.as_str());

    let body = json_body(get(&app, &format!("/api/game/session/{session_id}")).await).await;
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["completionPercentage"], 100.0);
    assert_eq!(body["screenResolution"], "1920x1080");
    assert!(body["endTime"].is_string());

    // Terminal sessions cannot be reopened.
    let res = send(
        &app,
        Method::PUT,
        &format!("/api/game/session/{session_id}"),
        None,
        Some(json!({"status": "IN_PROGRESS"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["error"].is_string());
}

#[tokio::test]
async fn unknown_session_and_track_are_404() {
    let app = app(test_state().await);

    let res = get(&app, "/api/game/session/does-not-exist").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(
        &app,
        Method::POST,
        "/api/game/session/start",
        None,
        Some(json!({"trackId": 404})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = get(&app, "/api/track/404").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_is_400_json() {
    let app = app(test_state().await);
    let res = send(
        &app,
        Method::POST,
        "/api/game/session/start",
        None,
        Some(json!({"trackId": "seven"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(res).await["error"].is_string());
}

#[tokio::test]
async fn run_program_simulates_on_server() {
    let state = test_state().await;
    let track = seed_track(&state, "Runner").await;
    let app = app(state);

    let res = send(
        &app,
        Method::POST,
        "/api/game/run",
        None,
        Some(json!({
            "trackId": track.id,
            "moves": ["FORWARD", "FORWARD", "RIGHT", "FORWARD", "FORWARD", "LEFT", "FORWARD", "FORWARD"]
        })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let outcome = json_body(res).await;
    assert_eq!(outcome["status"], "SUCCESS");
    assert_eq!(outcome["cellsVisited"], 7);

    let res = send(
        &app,
        Method::POST,
        "/api/game/run",
        None,
        Some(json!({"trackId": track.id, "moves": ["LEFT", "FORWARD"]})),
    )
    .await;
    let outcome = json_body(res).await;
    assert_eq!(outcome["status"], "FAILED");
    assert_eq!(outcome["errorPosition"], json!({"x": 0, "y": -1}));
}

#[tokio::test]
async fn quick_sessions_feed_totals() {
    let state = test_state().await;
    let track = seed_track(&state, "Quick").await;
    let app = app(state);

    for completed in [true, false, true] {
        let res = send(
            &app,
            Method::POST,
            "/api/game/session",
            None,
            Some(json!({"trackId": track.id, "completed": completed, "timeSpent": 30, "moves": 8})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body["success"], true);
        assert!(body["sessionId"].as_str().unwrap().starts_with("web_"));
    }

    let totals = json_body(get(&app, "/api/game/stats").await).await;
    assert_eq!(
        totals,
        json!({"totalSessions": 3, "completedSessions": 2, "completionRate": 66.67})
    );

    let basic = json_body(get(&app, "/api/game/stats/basic").await).await;
    assert_eq!(basic["totalSessionsThisWeek"], 3);
    assert_eq!(basic["successfulSessions"], 2);
    assert_eq!(basic["availableTracks"], 1);
}

#[tokio::test]
async fn legacy_track_lookup_hides_inactive() {
    let state = test_state().await;
    let track = seed_track(&state, "Legacy").await;
    seed_track(&state, "Other").await;
    let app_router = app(state.clone());

    let body = json_body(get(&app_router, &format!("/api/track/{}", track.id)).await).await;
    assert_eq!(body["name"], "Legacy");

    state
        .service
        .delete_track(track.id, &gfd_db::service::ActionContext::user("admin"))
        .await
        .unwrap();
    let res = get(&app_router, &format!("/api/track/{}", track.id)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn game_api_allows_cross_origin() {
    let app = app(test_state().await);
    let req = axum::http::Request::builder()
        .uri("/api/game/stats")
        .header("origin", "https://example.org")
        .body(axum::body::Body::empty())
        .unwrap();
    let res = tower::ServiceExt::oneshot(app, req).await.unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn quick_session_with_absurd_play_time_is_400() {
    let state = test_state().await;
    let track = seed_track(&state, "Quick").await;
    let app = app(state);

    for time_spent in [10_000_000_000_000_i64, i64::MAX] {
        let res = send(
            &app,
            Method::POST,
            "/api/game/session",
            None,
            Some(json!({"trackId": track.id, "completed": true, "timeSpent": time_spent, "moves": 8})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(res).await["error"].is_string());
    }

    let totals = json_body(get(&app, "/api/game/stats").await).await;
    assert_eq!(totals["totalSessions"], 0);
}

#[tokio::test]
async fn negative_progress_counters_are_400() {
    let state = test_state().await;
    let track = seed_track(&state, "Counters").await;
    let app = app(state);

    let started = json_body(
        send(
            &app,
            Method::POST,
            "/api/game/session/start",
            None,
            Some(json!({"trackId": track.id})),
        )
        .await,
    )
    .await;
    let session_id = started["sessionId"].as_str().unwrap().to_string();

    let res = send(
        &app,
        Method::PUT,
        &format!("/api/game/session/{session_id}"),
        None,
        Some(json!({"cellsVisited": -5})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(res).await,
        json!({"error": "cellsVisited must not be negative"})
    );

    let body = json_body(get(&app, &format!("/api/game/session/{session_id}")).await).await;
    assert_eq!(body["cellsVisited"], 0);
}
