use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::api::ApiResponse;
use crate::auth::require_admin;
use crate::error::{AppError, AppResult};
use crate::features::shared::csv as csv_util;
use crate::features::{current_user, FeatureState};
use crate::models::UserView;

use super::commands::{self, CreateUserCommand, SetPermissionsCommand, UpdateUserCommand};
use super::queries::{self, ListUsersQuery};

pub fn users_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/import", post(import_users))
        .route("/export", get(export_users))
        .route("/:id", get(get_user).post(update_user))
        .route("/:id/permissions", get(get_permissions).post(set_permissions))
}

#[tracing::instrument(skip(state, headers, query))]
async fn list_users(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<ApiResponse<Vec<UserView>>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_admin(&actor)?;

    let response = queries::list::handle(state.db.clone(), query).await?;
    let meta = json!({ "pagination": response.pagination });

    Ok(Json(ApiResponse::success_with_meta(response.items, meta)))
}

#[tracing::instrument(skip(state, headers, body))]
async fn create_user(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let actor = current_user(&state, &headers, Some(&body)).await?;
    require_admin(&actor)?;

    let command: CreateUserCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let user = commands::create::handle(&state, command).await?;

    tracing::info!(user_id = user.id, "User created via API");

    Ok(Json(ApiResponse::success(user)))
}

#[tracing::instrument(skip(state, headers), fields(id = %id))]
async fn get_user(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_admin(&actor)?;

    let user = queries::get::handle(state.db.clone(), id).await?;
    Ok(Json(ApiResponse::success(user)))
}

#[tracing::instrument(skip(state, headers, body), fields(id = %id))]
async fn update_user(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let actor = current_user(&state, &headers, Some(&body)).await?;
    require_admin(&actor)?;

    let mut command: UpdateUserCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    command.id = id;

    let user = commands::update::handle(&state, command).await?;

    tracing::info!(user_id = user.id, "User updated via API");

    Ok(Json(ApiResponse::success(user)))
}

#[tracing::instrument(skip(state, headers), fields(id = %id))]
async fn get_permissions(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<queries::permissions::PermissionsResponse>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_admin(&actor)?;

    let response = queries::permissions::handle(state.db.clone(), id).await?;
    Ok(Json(ApiResponse::success(response)))
}

#[tracing::instrument(skip(state, headers, body), fields(id = %id))]
async fn set_permissions(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let actor = current_user(&state, &headers, Some(&body)).await?;
    require_admin(&actor)?;

    let mut command: SetPermissionsCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    command.id = id;

    let user = commands::set_permissions::handle(&state, command).await?;

    tracing::info!(user_id = user.id, "Permissions replaced via API");

    Ok(Json(ApiResponse::success(user)))
}

#[tracing::instrument(skip(state, headers, multipart))]
async fn import_users(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<csv_util::ImportReport>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_admin(&actor)?;

    let bytes = read_file_field(multipart).await?;
    let report = commands::import::handle(&state, &bytes).await?;

    Ok(Json(ApiResponse::success(report)))
}

#[tracing::instrument(skip(state, headers))]
async fn export_users(
    State(state): State<FeatureState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let actor = current_user(&state, &headers, None).await?;
    require_admin(&actor)?;

    let body = queries::export::handle(state.db.clone()).await?;
    Ok(csv_util::attachment(&queries::export::export_filename(), body))
}

/// Pull the bytes of the multipart `file` field
pub(crate) async fn read_file_field(mut multipart: Multipart) -> AppResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::BadRequest("Multipart field 'file' is required".into()))
}
