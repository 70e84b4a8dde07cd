use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};

use crate::api::ApiResponse;
use crate::auth;
use crate::error::{AppError, AppResult};
use crate::features::FeatureState;
use crate::models::UserView;

use super::commands::{self, ChangePasswordCommand, LoginCommand, LogoutCommand};

pub fn auth_routes() -> Router<FeatureState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
        .route("/password", patch(change_password))
}

#[tracing::instrument(skip(state, command), fields(email = %command.email))]
async fn login(
    State(state): State<FeatureState>,
    Json(command): Json<LoginCommand>,
) -> AppResult<Response> {
    let response = commands::login::handle(&state, command).await?;

    let cookie = auth::session_cookie(
        &state.session.cookie_name,
        &response.token,
        state.session.cookie_hours,
        state.session.cookie_secure,
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::success(response)),
    )
        .into_response())
}

#[tracing::instrument(skip(state, headers, body))]
async fn logout(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    body: Option<Json<serde_json::Value>>,
) -> AppResult<Response> {
    let token = auth::extract_token(
        &headers,
        &state.session.cookie_name,
        body.as_ref().map(|Json(value)| value),
    );

    let response = commands::logout::handle(&state, LogoutCommand { token }).await?;

    let cookie = auth::clear_session_cookie(&state.session.cookie_name, state.session.cookie_secure);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::success(response)),
    )
        .into_response())
}

#[tracing::instrument(skip(state, headers))]
async fn profile(
    State(state): State<FeatureState>,
    headers: HeaderMap,
) -> AppResult<Json<ApiResponse<UserView>>> {
    let token = auth::extract_token(&headers, &state.session.cookie_name, None);
    let user = auth::authenticate(&state.db, token.as_deref()).await?;

    Ok(Json(ApiResponse::success(UserView::from(&user))))
}

#[tracing::instrument(skip(state, headers, body))]
async fn change_password(
    State(state): State<FeatureState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let token = auth::extract_token(&headers, &state.session.cookie_name, Some(&body));
    let user = auth::authenticate(&state.db, token.as_deref()).await?;

    let command: ChangePasswordCommand = serde_json::from_value(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))?;

    commands::change_password::handle(&state, &user, command).await?;

    Ok(Json(ApiResponse::success(serde_json::json!({
        "changed": true
    }))))
}
