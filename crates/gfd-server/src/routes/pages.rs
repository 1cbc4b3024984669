//! Back-office HTML pages. Every view is audited as READ.

use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;

use gfd_core::enums::AuditActionType;
use gfd_core::paging::SortDirection;
use gfd_db::repos::audit::AuditFilter;

use crate::error::ApiError;
use crate::extract::{Admin, ApiQuery};
use crate::html;
use crate::query::PageParams;
use crate::state::AppState;

const RESOURCE: &str = "PAGE";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/users", get(users))
        .route("/admin/tracks", get(tracks))
        .route("/admin/audit", get(audit))
        .route("/admin/statistics", get(statistics))
        .route("/config/tracks", get(track_designer))
}

async fn record_view(state: &AppState, admin: &Admin, page: &str) {
    state
        .service
        .log_action(
            admin
                .ctx
                .event(format!("Viewed {page}"), AuditActionType::Read, RESOURCE)
                .resource_id(page),
        )
        .await;
}

fn fmt_time(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn pager(number: u32, total_pages: u64, base: &str) -> String {
    let mut out = String::from("<p class=\"pager\">");
    if number > 0 {
        out.push_str(&format!("<a href=\"{base}?page={}\">Previous</a> ", number - 1));
    }
    out.push_str(&format!("Page {} of {}", number + 1, total_pages.max(1)));
    if u64::from(number) + 1 < total_pages {
        out.push_str(&format!(" <a href=\"{base}?page={}\">Next</a>", number + 1));
    }
    out.push_str("</p>");
    out
}

async fn dashboard(State(state): State<AppState>, admin: Admin) -> Result<Html<String>, ApiError> {
    let stats = state.service.dashboard_stats().await?;
    let sessions = state.service.recent_sessions(10).await?;
    let entries = state.service.recent_audit(10).await?;

    let mut body = html::summary(&[
        ("Active users", stats.total_users.to_string()),
        ("Active tracks", stats.total_tracks.to_string()),
        ("Sessions today", stats.sessions_today.to_string()),
        ("Sessions this week", stats.sessions_this_week.to_string()),
        ("Success rate", format!("{:.2}%", stats.success_rate)),
        ("Audit entries this week", stats.audit_entries_this_week.to_string()),
    ]);
    body.push_str("\n<h2>Recent games</h2>\n");
    let rows: Vec<Vec<String>> = sessions
        .iter()
        .map(|s| {
            vec![
                s.session_id.clone(),
                s.track_id.to_string(),
                s.status.to_string(),
                s.device_type.to_string(),
                fmt_time(s.start_time),
            ]
        })
        .collect();
    body.push_str(&html::table(&["Session", "Track", "Status", "Device", "Started"], &rows));
    body.push_str("\n<h2>Recent activity</h2>\n");
    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| vec![fmt_time(e.timestamp), e.username.clone(), e.action.clone()])
        .collect();
    body.push_str(&html::table(&["When", "User", "Action"], &rows));

    record_view(&state, &admin, "dashboard").await;
    Ok(html::page("Dashboard", Some(&admin.principal), &body))
}

async fn users(
    State(state): State<AppState>,
    admin: Admin,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Html<String>, ApiError> {
    let general = &state.config.general;
    let request = params
        .to_request(general.default_page_size, general)
        .sorted("username", SortDirection::Asc);
    let page = state.service.list_users(&request, None, None).await?;

    let rows: Vec<Vec<String>> = page
        .content
        .iter()
        .map(|u| {
            vec![
                u.username.clone(),
                u.full_name.clone(),
                u.email.clone(),
                u.role.to_string(),
                if u.is_active { "Active" } else { "Inactive" }.into(),
                u.last_login.map(fmt_time).unwrap_or_default(),
            ]
        })
        .collect();
    let mut body = html::table(
        &["Username", "Name", "Email", "Role", "Status", "Last login"],
        &rows,
    );
    body.push_str(&pager(page.number, page.total_pages, "/admin/users"));

    record_view(&state, &admin, "users").await;
    Ok(html::page("Users", Some(&admin.principal), &body))
}

async fn tracks(
    State(state): State<AppState>,
    admin: Admin,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Html<String>, ApiError> {
    let general = &state.config.general;
    let page = state
        .service
        .list_tracks(&params.to_request(general.default_page_size, general))
        .await?;

    let rows: Vec<Vec<String>> = page
        .content
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.name.clone(),
                t.difficulty_level.to_string(),
                if t.is_active { "Active" } else { "Inactive" }.into(),
                fmt_time(t.updated_at),
            ]
        })
        .collect();
    let mut body = html::table(&["Id", "Name", "Difficulty", "Status", "Updated"], &rows);
    body.push_str(&pager(page.number, page.total_pages, "/admin/tracks"));

    record_view(&state, &admin, "tracks").await;
    Ok(html::page("Tracks", Some(&admin.principal), &body))
}

async fn audit(
    State(state): State<AppState>,
    admin: Admin,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Html<String>, ApiError> {
    let general = &state.config.general;
    let page = state
        .service
        .query_audit(
            &AuditFilter::default(),
            &params.to_request(general.audit_page_size, general),
        )
        .await?;

    let rows: Vec<Vec<String>> = page
        .content
        .iter()
        .map(|e| {
            vec![
                fmt_time(e.timestamp),
                e.username.clone(),
                e.action.clone(),
                e.action_type.to_string(),
                e.resource_type.clone(),
                e.resource_name.clone().unwrap_or_default(),
                e.status.to_string(),
            ]
        })
        .collect();
    let mut body = html::table(
        &["When", "User", "Action", "Type", "Resource", "Name", "Status"],
        &rows,
    );
    body.push_str(&pager(page.number, page.total_pages, "/admin/audit"));

    record_view(&state, &admin, "audit log").await;
    Ok(html::page("Audit log", Some(&admin.principal), &body))
}

async fn statistics(
    State(state): State<AppState>,
    admin: Admin,
) -> Result<Html<String>, ApiError> {
    let overview = state.service.system_overview().await?;
    let tracks = state.service.track_success_stats().await?;
    let devices = state.service.device_stats().await?;

    let mut body = html::summary(&[
        ("Games (30 days)", overview.total_sessions.to_string()),
        ("Successful", overview.successful_sessions.to_string()),
        ("Failed", overview.failed_sessions.to_string()),
        ("Success rate", format!("{:.2}%", overview.success_rate)),
        ("Average moves", format!("{:.1}", overview.avg_moves)),
        ("Average time", format!("{} ms", overview.avg_execution_time_ms)),
    ]);
    body.push_str("\n<h2>Tracks</h2>\n");
    let rows: Vec<Vec<String>> = tracks
        .iter()
        .map(|t| {
            vec![
                t.track_name.clone(),
                t.total_sessions.to_string(),
                t.successful_sessions.to_string(),
                format!("{:.2}%", t.success_rate),
            ]
        })
        .collect();
    body.push_str(&html::table(&["Track", "Games", "Successful", "Success rate"], &rows));
    body.push_str("\n<h2>Devices</h2>\n");
    let rows: Vec<Vec<String>> = devices
        .iter()
        .map(|d| {
            vec![
                d.device_type.clone(),
                d.total_sessions.to_string(),
                format!("{:.2}%", d.success_rate),
            ]
        })
        .collect();
    body.push_str(&html::table(&["Device", "Games", "Success rate"], &rows));

    record_view(&state, &admin, "statistics").await;
    Ok(html::page("Statistics", Some(&admin.principal), &body))
}

async fn track_designer(
    State(state): State<AppState>,
    admin: Admin,
) -> Result<Html<String>, ApiError> {
    let tracks = state.service.list_active_tracks().await?;
    let mut body = String::new();
    for track in &tracks {
        body.push_str(&format!(
            "<section>\n<h2>{}</h2>\n{}\n</section>\n",
            html::escape(&track.name),
            html::grid_preview(track)
        ));
    }
    if tracks.is_empty() {
        body.push_str("<p>No active tracks</p>");
    }

    record_view(&state, &admin, "track designer").await;
    Ok(html::page("Track designer", Some(&admin.principal), &body))
}
