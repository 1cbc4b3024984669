use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use gfd_core::enums::AuditActionType;
use gfd_core::stats::{
    ActivitySeries, AuditStatistics, CompleteStatistics, DashboardStats, DeviceStats, ErrorStats,
    SystemOverviewStats, SystemReport, TrackSuccessStats, TrackTimeStats, UserAuditStats,
};
use gfd_db::repos::statistics::daily_activity_csv;

use crate::error::ApiError;
use crate::extract::{Admin, ApiQuery};
use crate::query::DaysParam;
use crate::state::AppState;

const RESOURCE: &str = "STATISTICS";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(audit_statistics))
        .route("/statistics/dashboard", get(dashboard))
        .route("/statistics/tracks", get(tracks))
        .route("/statistics/devices", get(devices))
        .route("/statistics/times", get(times))
        .route("/statistics/errors", get(errors))
        .route("/statistics/users", get(users))
        .route("/statistics/overview", get(overview))
        .route("/statistics/report", get(report))
        .route("/statistics/complete", get(complete))
        .route("/statistics/export", get(export))
        .route("/dashboard/activity", get(dashboard_activity))
}

async fn audit_statistics(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<AuditStatistics>, ApiError> {
    Ok(Json(state.service.audit_statistics().await?))
}

async fn dashboard(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<DashboardStats>, ApiError> {
    Ok(Json(state.service.dashboard_stats().await?))
}

async fn tracks(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<TrackSuccessStats>>, ApiError> {
    Ok(Json(state.service.track_success_stats().await?))
}

async fn devices(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<DeviceStats>>, ApiError> {
    Ok(Json(state.service.device_stats().await?))
}

async fn times(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<TrackTimeStats>>, ApiError> {
    Ok(Json(state.service.average_completion_times().await?))
}

async fn errors(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<ErrorStats>>, ApiError> {
    Ok(Json(state.service.most_common_errors().await?))
}

async fn users(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<Vec<UserAuditStats>>, ApiError> {
    Ok(Json(state.service.user_audit_stats().await?))
}

async fn overview(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<SystemOverviewStats>, ApiError> {
    Ok(Json(state.service.system_overview().await?))
}

async fn report(
    State(state): State<AppState>,
    _admin: Admin,
) -> Result<Json<SystemReport>, ApiError> {
    Ok(Json(state.service.system_report().await?))
}

async fn complete(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(params): ApiQuery<DaysParam>,
) -> Result<Json<CompleteStatistics>, ApiError> {
    Ok(Json(
        state
            .service
            .complete_statistics(params.days_or(7))
            .await?,
    ))
}

async fn dashboard_activity(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(params): ApiQuery<DaysParam>,
) -> Result<Json<ActivitySeries>, ApiError> {
    Ok(Json(
        state
            .service
            .dashboard_activity(params.days_or(7))
            .await?,
    ))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ExportFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Deserialize)]
struct ExportQuery {
    #[serde(default)]
    format: ExportFormat,
    days: Option<u32>,
}

/// JSON exports the full report; CSV exports daily activity for `days`.
async fn export(
    State(state): State<AppState>,
    admin: Admin,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<Response, ApiError> {
    let days = DaysParam { days: query.days }.days_or(30);
    let response = match query.format {
        ExportFormat::Json => {
            let report = state.service.system_report().await?;
            (
                [(CONTENT_DISPOSITION, "attachment; filename=\"statistics.json\"")],
                Json(report),
            )
                .into_response()
        }
        ExportFormat::Csv => {
            let rows = state.service.daily_activity(days).await?;
            (
                [
                    (CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (CONTENT_DISPOSITION, "attachment; filename=\"statistics.csv\""),
                ],
                daily_activity_csv(&rows),
            )
                .into_response()
        }
    };

    state
        .service
        .log_action(
            admin
                .ctx
                .event("Statistics exported", AuditActionType::Export, RESOURCE)
                .details(format!("format={:?}, days={days}", query.format).to_lowercase()),
        )
        .await;
    Ok(response)
}
