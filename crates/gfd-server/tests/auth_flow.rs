mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use common::{
    admin_app, get, header, json_body, login, post_login, send, test_state, text_body,
};
use gfd_core::enums::{AuditActionType, AuditStatus};
use gfd_db::repos::audit::AuditFilter;
use gfd_server::app;

#[tokio::test]
async fn root_redirects_to_game() {
    let app = app(test_state().await);
    let res = get(&app, "/").await;
    assert!(res.status().is_redirection());
    assert_eq!(header(&res, "location"), "/game");
}

#[tokio::test]
async fn game_page_embeds_track() {
    let state = test_state().await;
    let track = common::seed_track(&state, "Page <Track>").await;
    let app = app(state);

    let res = get(&app, &format!("/game?trackId={}", track.id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = text_body(res).await;
    assert!(html.contains("Page &lt;Track&gt;"));
    assert!(html.contains(r#"id="track-data""#));
}

#[tokio::test]
async fn game_page_without_tracks() {
    let app = app(test_state().await);
    let html = text_body(get(&app, "/game?logout=true").await).await;
    assert!(html.contains("No tracks available"));
    assert!(html.contains("You have been logged out."));
}

#[tokio::test]
async fn login_sets_http_only_cookie_and_audits() {
    let state = test_state().await;
    let app = app(state.clone());

    let res = post_login(&app, "admin", common::ADMIN_PASSWORD).await;
    assert!(res.status().is_redirection());
    assert_eq!(header(&res, "location"), "/admin/dashboard");
    let cookie = header(&res, "set-cookie");
    assert!(cookie.starts_with("GFD_SESSION="));
    assert!(cookie.contains("HttpOnly"));

    let latest = state.service.latest_audit().await.unwrap().unwrap();
    assert_eq!(latest.action_type, AuditActionType::Login);
    assert_eq!(latest.status, AuditStatus::Success);
}

#[tokio::test]
async fn oversized_session_ttl_is_clamped_on_login() {
    let state = test_state().await;
    let mut config = (*state.config).clone();
    config.auth.session_ttl_hours = i64::MAX;
    let state = gfd_server::AppState {
        config: std::sync::Arc::new(config),
        ..state
    };
    let app = app(state);

    let res = post_login(&app, "admin", common::ADMIN_PASSWORD).await;
    assert!(res.status().is_redirection());
    assert_eq!(header(&res, "location"), "/admin/dashboard");
    assert!(header(&res, "set-cookie").contains("Max-Age=31536000"));
}

#[tokio::test]
async fn failed_login_redirects_with_error() {
    let state = test_state().await;
    let app = app(state.clone());

    let res = post_login(&app, "admin", "wrong-password").await;
    assert!(res.status().is_redirection());
    assert_eq!(header(&res, "location"), "/login?error=true");
    assert_eq!(header(&res, "set-cookie"), "");

    let failed = state
        .service
        .list_audit(&AuditFilter {
            status: Some(AuditStatus::Failed),
            ..AuditFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);

    let html = text_body(get(&app, "/login?error=true").await).await;
    assert!(html.contains("Invalid username or password"));
}

#[tokio::test]
async fn signed_in_user_skips_login_form() {
    let (app, _, cookie) = admin_app().await;
    let res = send(&app, Method::GET, "/login", Some(&cookie), None).await;
    assert!(res.status().is_redirection());
    assert_eq!(header(&res, "location"), "/admin/dashboard");
}

#[rstest]
#[case("/api/admin/users")]
#[case("/api/admin/statistics")]
#[case("/api/admin/dashboard/activity")]
#[tokio::test]
async fn admin_api_requires_session(#[case] uri: &str) {
    let app = app(test_state().await);
    let res = get(&app, uri).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await, json!({"error": "Authentication required"}));
}

#[rstest]
#[case("/admin/dashboard")]
#[case("/admin/users")]
#[case("/config/tracks")]
#[tokio::test]
async fn admin_pages_redirect_to_login(#[case] uri: &str) {
    let app = app(test_state().await);
    let res = get(&app, uri).await;
    assert!(res.status().is_redirection());
    assert_eq!(header(&res, "location"), "/login");
}

#[tokio::test]
async fn bogus_cookie_is_rejected() {
    let app = app(test_state().await);
    let res = send(
        &app,
        Method::GET,
        "/api/admin/users",
        Some("GFD_SESSION=not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case("/admin/dashboard", "Dashboard")]
#[case("/admin/users", "Users")]
#[case("/admin/tracks", "Tracks")]
#[case("/admin/audit", "Audit log")]
#[case("/admin/statistics", "Statistics")]
#[case("/config/tracks", "Track designer")]
#[tokio::test]
async fn admin_pages_render_and_audit(#[case] uri: &str, #[case] title: &str) {
    let (app, state, cookie) = admin_app().await;

    let res = send(&app, Method::GET, uri, Some(&cookie), None).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = text_body(res).await;
    assert!(html.contains(&format!("<h1>{title}</h1>")));
    assert!(html.contains("Site Admin"));

    let latest = state.service.latest_audit().await.unwrap().unwrap();
    assert_eq!(latest.action_type, AuditActionType::Read);
    assert_eq!(latest.resource_type, "PAGE");
    assert_eq!(latest.username, "admin");
}

#[rstest]
#[case(Method::POST)]
#[case(Method::GET)]
#[tokio::test]
async fn logout_revokes_session(#[case] method: Method) {
    let (app, state, cookie) = admin_app().await;

    let res = send(&app, method, "/logout", Some(&cookie), None).await;
    assert!(res.status().is_redirection());
    assert_eq!(header(&res, "location"), "/game?logout=true");
    assert!(header(&res, "set-cookie").contains("Max-Age=0"));

    let latest = state.service.latest_audit().await.unwrap().unwrap();
    assert_eq!(latest.action_type, AuditActionType::Logout);

    let res = send(&app, Method::GET, "/api/admin/users", Some(&cookie), None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deactivated_admin_loses_access() {
    let (app, state, _) = admin_app().await;
    let other = state
        .service
        .create_user(
            gfd_db::repos::user::NewUser {
                username: "second".into(),
                email: "second@example.com".into(),
                password: "secret456".into(),
                full_name: None,
                role: gfd_core::enums::Role::Admin,
                is_active: true,
            },
            &gfd_db::service::ActionContext::user("admin"),
        )
        .await
        .unwrap();
    let res = post_login(&app, "second", "secret456").await;
    let cookie = header(&res, "set-cookie").split(';').next().unwrap().to_string();

    let admin_cookie = login(&app).await;
    let res = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/users/{}", other.id),
        Some(&admin_cookie),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&app, Method::GET, "/api/admin/users", Some(&cookie), None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
