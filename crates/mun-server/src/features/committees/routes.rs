use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::api::ApiResponse;
use crate::auth::require_presidium;
use crate::error::{AppError, AppResult};
use crate::features::delegates::queries::by_committee;
use crate::features::{current_user, FeatureState};
use crate::models::{CommitteeSessionView, CommitteeView, DelegateView};

use super::commands::{self, AddSessionCommand, CreateCommitteeCommand, UpdateCommitteeCommand};
use super::queries;

pub fn venues_routes() -> Router<FeatureState> {
    Router::new()
        .route("/", get(list_venues).post(create_venue))
        .route("/:id", get(get_venue).post(update_venue).delete(delete_venue))
        .route("/:id/sessions", post(add_session))
        .route("/:id/delegates", get(venue_delegates))
}

#[tracing::instrument(skip(state, headers))]
async fn list_venues(
    State(state): State<FeatureState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<Vec<CommitteeView>>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    let venues = queries::list::handle(state.db.clone()).await?;
    Ok(Json(ApiResponse::success(venues)))
}

#[tracing::instrument(skip(state, headers, body))]
async fn create_venue(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<CommitteeView>>> {
    let actor = current_user(&state, &headers, Some(&body)).await?;
    require_presidium(&actor)?;

    let command: CreateCommitteeCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    let venue = commands::create::handle(&state, command, actor.id).await?;

    tracing::info!(committee_id = venue.id, "Committee created via API");

    Ok(Json(ApiResponse::success(venue)))
}

#[tracing::instrument(skip(state, headers), fields(id = %id))]
async fn get_venue(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<CommitteeView>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    let venue = queries::get::handle(state.db.clone(), id).await?;
    Ok(Json(ApiResponse::success(venue)))
}

#[tracing::instrument(skip(state, headers, body), fields(id = %id))]
async fn update_venue(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<CommitteeView>>> {
    let actor = current_user(&state, &headers, Some(&body)).await?;
    require_presidium(&actor)?;

    let mut command: UpdateCommitteeCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    command.id = id;

    let venue = commands::update::handle(&state, command).await?;

    Ok(Json(ApiResponse::success(venue)))
}

#[tracing::instrument(skip(state, headers), fields(id = %id))]
async fn delete_venue(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    commands::delete::handle(&state, id).await?;

    Ok(Json(ApiResponse::success(json!({ "deleted": true }))))
}

#[tracing::instrument(skip(state, headers, body), fields(id = %id))]
async fn add_session(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<CommitteeSessionView>>> {
    let actor = current_user(&state, &headers, Some(&body)).await?;
    require_presidium(&actor)?;

    let mut command: AddSessionCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;
    command.committee_id = id;

    let session = commands::add_session::handle(&state, command).await?;

    Ok(Json(ApiResponse::success(session)))
}

#[tracing::instrument(skip(state, headers), fields(id = %id))]
async fn venue_delegates(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Vec<DelegateView>>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_presidium(&actor)?;

    let delegates = by_committee::handle(state.db.clone(), id).await?;
    Ok(Json(ApiResponse::success(delegates)))
}
