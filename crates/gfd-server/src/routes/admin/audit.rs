use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use gfd_core::entities::AuditLog;
use gfd_core::enums::{AuditActionType, AuditStatus};
use gfd_core::paging::Page;
use gfd_db::repos::audit::AuditFilter;

use crate::error::ApiError;
use crate::extract::{Admin, ApiQuery};
use crate::query::{PageParams, parse_optional_bound};
use crate::state::AppState;

const RESOURCE: &str = "AUDIT";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/audit", get(list_audit))
        .route("/audit/search", get(search_audit))
        .route("/audit/export", get(export_audit))
        .route("/audit/{id}", get(get_audit_entry))
}

/// Search criteria as sent by the audit screen.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuditSearch {
    action: Option<AuditActionType>,
    entity: Option<String>,
    username: Option<String>,
    status: Option<AuditStatus>,
    from_date: Option<String>,
    to_date: Option<String>,
}

impl AuditSearch {
    fn to_filter(&self) -> Result<AuditFilter, ApiError> {
        let non_blank = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Ok(AuditFilter {
            username: non_blank(&self.username),
            action_type: self.action,
            resource_type: non_blank(&self.entity),
            status: self.status,
            from: parse_optional_bound(self.from_date.as_deref(), false)?,
            to: parse_optional_bound(self.to_date.as_deref(), true)?,
        })
    }
}

async fn list_audit(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Page<AuditLog>>, ApiError> {
    let general = &state.config.general;
    Ok(Json(
        state
            .service
            .query_audit(
                &AuditFilter::default(),
                &params.to_request(general.audit_page_size, general),
            )
            .await?,
    ))
}

async fn search_audit(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(search): ApiQuery<AuditSearch>,
) -> Result<Json<Page<AuditLog>>, ApiError> {
    let general = &state.config.general;
    let filter = search.to_filter()?;
    Ok(Json(
        state
            .service
            .query_audit(&filter, &params.to_request(general.audit_page_size, general))
            .await?,
    ))
}

async fn get_audit_entry(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<AuditLog>, ApiError> {
    Ok(Json(state.service.get_audit_entry(id).await?))
}

async fn export_audit(
    State(state): State<AppState>,
    admin: Admin,
    ApiQuery(search): ApiQuery<AuditSearch>,
) -> Result<Response, ApiError> {
    let filter = search.to_filter()?;
    let body = state.service.export_audit(&filter).await?;
    state
        .service
        .log_action(
            admin
                .ctx
                .event("Audit log exported", AuditActionType::Export, RESOURCE),
        )
        .await;
    Ok((
        [
            (CONTENT_TYPE, "application/x-ndjson"),
            (CONTENT_DISPOSITION, "attachment; filename=\"audit-log.jsonl\""),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_criteria_are_ignored() {
        let search = AuditSearch {
            username: Some("  ".into()),
            entity: Some(String::new()),
            from_date: Some(String::new()),
            ..AuditSearch::default()
        };
        let filter = search.to_filter().unwrap();
        assert_eq!(filter.username, None);
        assert_eq!(filter.resource_type, None);
        assert_eq!(filter.from, None);
    }

    #[test]
    fn bad_date_is_rejected() {
        let search = AuditSearch {
            to_date: Some("31/12/2024".into()),
            ..AuditSearch::default()
        };
        assert!(matches!(search.to_filter(), Err(ApiError::BadRequest(_))));
    }
}
