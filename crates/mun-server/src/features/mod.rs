//! Feature modules implementing the MUN back-office API
//!
//! Each feature is a vertical slice in CQRS style:
//! - `commands/` - Write operations (create, update, delete, import)
//! - `queries/` - Read operations (get, list, export)
//! - `routes.rs` - HTTP route definitions
//!
//! # Features
//!
//! - **auth**: login/logout, profile, password change
//! - **users**: account management, permission overrides, CSV import/export
//! - **delegates**: country assignments, CSV import/export
//! - **committees**: venues with dais, time configuration and agenda sessions
//! - **logs**: audit trail listing and purge

pub mod auth;
pub mod committees;
pub mod delegates;
pub mod logs;
pub mod shared;
pub mod users;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::api::ApiResponse;
use crate::audit::Auditor;
use crate::config::SessionConfig;
use crate::error::AppResult;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub db: sqlx::PgPool,
    pub auditor: Arc<Auditor>,
    pub session: SessionConfig,
}

/// Creates the API router with all feature routes mounted
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .nest("/auth", auth::auth_routes())
        .nest("/users", users::users_routes())
        .nest("/delegates", delegates::delegates_routes())
        .nest("/venues", committees::venues_routes())
        .nest("/logs", logs::logs_routes())
        .with_state(state)
}

/// Resolve the requesting user from header, cookie, or (optionally) an
/// already-parsed JSON body
pub(crate) async fn current_user(
    state: &FeatureState,
    headers: &axum::http::HeaderMap,
    body: Option<&serde_json::Value>,
) -> AppResult<crate::models::UserRow> {
    let token = crate::auth::extract_token(headers, &state.session.cookie_name, body);
    crate::auth::authenticate(&state.db, token.as_deref()).await
}

/// Liveness/readiness check: verifies database connectivity
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<FeatureState>) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "status": "ok",
        "database": "up",
    }))))
}

/// Health router, mounted outside the /api prefix
pub fn health_routes(state: FeatureState) -> Router<()> {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}
