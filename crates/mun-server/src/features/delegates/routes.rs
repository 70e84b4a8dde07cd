use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use crate::api::ApiResponse;
use crate::auth::require_presidium;
use crate::error::{AppError, AppResult};
use crate::features::shared::csv as csv_util;
use crate::features::users::routes::read_file_field;
use crate::features::{current_user, FeatureState};
use crate::models::DelegateView;

use super::commands::{self, UpsertDelegateCommand};
use super::queries::{self, ListDelegatesQuery};

pub fn delegates_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_delegates).post(upsert_delegate))
        .route("/import", post(import_delegates))
        .route("/export", get(export_delegates))
        .route("/:id", delete(delete_delegate))
}

#[tracing::instrument(skip(state, headers, query))]
async fn list_delegates(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Query(query): Query<ListDelegatesQuery>,
) -> AppResult<Json<ApiResponse<Vec<DelegateView>>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    let response = queries::list::handle(state.db.clone(), query).await?;
    let meta = json!({ "pagination": response.pagination });

    Ok(Json(ApiResponse::success_with_meta(response.items, meta)))
}

#[tracing::instrument(skip(state, headers, body))]
async fn upsert_delegate(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<DelegateView>>> {
    let actor = current_user(&state, &headers, Some(&body)).await?;
    require_presidium(&actor)?;

    let command: UpsertDelegateCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let delegate = commands::upsert::handle(&state, command).await?;

    Ok(Json(ApiResponse::success(delegate)))
}

#[tracing::instrument(skip(state, headers), fields(id = %id))]
async fn delete_delegate(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    commands::delete::handle(&state, id).await?;

    Ok(Json(ApiResponse::success(json!({ "deleted": true }))))
}

#[tracing::instrument(skip(state, headers, multipart))]
async fn import_delegates(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<csv_util::ImportReport>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    let bytes = read_file_field(multipart).await?;
    let report = commands::import::handle(&state, &bytes).await?;

    Ok(Json(ApiResponse::success(report)))
}

#[tracing::instrument(skip(state, headers))]
async fn export_delegates(
    State(state): State<FeatureState>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    let body = queries::export::handle(state.db.clone()).await?;
    Ok(csv_util::attachment(queries::export::EXPORT_FILENAME, body))
}
