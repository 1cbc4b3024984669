use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use gfd_core::entities::{User, compose_full_name};
use gfd_core::enums::Role;
use gfd_core::paging::Page;
use gfd_db::repos::user::NewUser;
use gfd_db::updates::user::UserUpdate;

use crate::error::ApiError;
use crate::extract::{Admin, ApiJson, ApiQuery};
use crate::query::PageParams;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/search", get(search_users))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/{id}/password", patch(change_password))
        .route("/users/{id}/reactivate", post(reactivate_user))
}

#[derive(Debug, Default, Deserialize)]
struct UserFilter {
    search: Option<String>,
    role: Option<Role>,
}

async fn list_users(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(params): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> Result<Json<Page<User>>, ApiError> {
    let general = &state.config.general;
    let page = state
        .service
        .list_users(
            &params.to_request(general.default_page_size, general),
            filter.search.as_deref(),
            filter.role,
        )
        .await?;
    Ok(Json(page))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    #[serde(default)]
    search_term: String,
}

async fn search_users(
    State(state): State<AppState>,
    _admin: Admin,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.service.search_users(&query.search_term).await?))
}

async fn get_user(
    State(state): State<AppState>,
    _admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.service.get_user(id).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUser {
    username: String,
    email: String,
    password: String,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    #[serde(default = "default_role")]
    role: Role,
    is_active: Option<bool>,
}

const fn default_role() -> Role {
    Role::Admin
}

impl CreateUser {
    fn into_new_user(self) -> NewUser {
        let full_name = self.full_name.unwrap_or_else(|| {
            compose_full_name(
                self.first_name.as_deref(),
                self.last_name.as_deref(),
                &self.username,
            )
        });
        NewUser {
            username: self.username,
            email: self.email,
            password: self.password,
            full_name: Some(full_name),
            role: self.role,
            is_active: self.is_active.unwrap_or(true),
        }
    }
}

async fn create_user(
    State(state): State<AppState>,
    admin: Admin,
    ApiJson(body): ApiJson<CreateUser>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .service
        .create_user(body.into_new_user(), &admin.ctx)
        .await?;
    Ok(Json(user))
}

/// Partial user edit. Absent fields are left unchanged; `firstName` and
/// `lastName` are joined into the full name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditUser {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    full_name: Option<String>,
    role: Option<Role>,
    is_active: Option<bool>,
}

impl EditUser {
    fn into_update(self, current_username: &str) -> UserUpdate {
        let full_name = self.full_name.or_else(|| {
            (self.first_name.is_some() || self.last_name.is_some()).then(|| {
                compose_full_name(
                    self.first_name.as_deref(),
                    self.last_name.as_deref(),
                    self.username.as_deref().unwrap_or(current_username),
                )
            })
        });
        UserUpdate {
            username: self.username,
            email: self.email,
            password: self.password,
            full_name,
            role: self.role,
            is_active: self.is_active,
        }
    }
}

async fn update_user(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<EditUser>,
) -> Result<Json<User>, ApiError> {
    let current = state.service.get_user(id).await?;
    let update = body.into_update(&current.username);
    Ok(Json(state.service.update_user(id, update, &admin.ctx).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.service.delete_user(id, &admin.ctx).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewPassword {
    new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<NewPassword>,
) -> Result<Json<Value>, ApiError> {
    state
        .service
        .change_password(id, &body.new_password, &admin.ctx)
        .await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

async fn reactivate_user(
    State(state): State<AppState>,
    admin: Admin,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.service.reactivate_user(id, &admin.ctx).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn create_composes_full_name() {
        let body: CreateUser = serde_json::from_value(json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "secret1",
            "firstName": "Ada",
            "lastName": "Lovelace"
        }))
        .unwrap();
        let user = body.into_new_user();
        assert_eq!(user.full_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(user.role, Role::Admin);
        assert!(user.is_active);
    }

    #[test]
    fn edit_without_names_keeps_full_name() {
        let edit: EditUser = serde_json::from_value(json!({"email": "new@example.com"})).unwrap();
        let update = edit.into_update("ada");
        assert_eq!(update.full_name, None);
        assert_eq!(update.email.as_deref(), Some("new@example.com"));
    }

    #[test]
    fn edit_with_last_name_only() {
        let edit: EditUser = serde_json::from_value(json!({"lastName": "Byron"})).unwrap();
        assert_eq!(edit.into_update("ada").full_name.as_deref(), Some("Byron"));
    }
}
