use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde_json::json;

use crate::api::ApiResponse;
use crate::auth::require_admin;
use crate::error::AppResult;
use crate::features::{current_user, FeatureState};
use crate::models::LogView;

use super::commands::purge;
use super::queries::{self, ListLogsQuery};

pub fn logs_routes() -> Router<FeatureState> {
    Router::new().route("/", get(list_logs).delete(purge_logs))
}

#[tracing::instrument(skip(state, headers, query))]
async fn list_logs(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Query(query): Query<ListLogsQuery>,
) -> AppResult<Json<ApiResponse<Vec<LogView>>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_admin(&actor)?;

    let response = queries::list::handle(state.db.clone(), query).await?;
    let meta = json!({ "pagination": response.pagination });

    Ok(Json(ApiResponse::success_with_meta(response.items, meta)))
}

#[tracing::instrument(skip(state, headers))]
async fn purge_logs(
    State(state): State<FeatureState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<purge::PurgeResponse>>> {
    let actor = current_user(&state, &headers, None).await?;
    require_admin(&actor)?;

    let response = purge::handle(&state, actor.id).await?;

    Ok(Json(ApiResponse::success(response)))
}
