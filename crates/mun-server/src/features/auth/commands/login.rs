//! Login command
//!
//! Verifies the password, issues a fresh session token (replacing any
//! previous one, so each user has at most one active session), and stamps
//! last_login.

use serde::{Deserialize, Serialize};

use crate::audit::params::Params;
use crate::auth;
use crate::error::AppError;
use crate::features::shared::validation::{validate_email, validate_required, FieldValidationError};
use crate::features::FeatureState;
use crate::models::{UserRow, UserView};

const UPDATE_SESSION: &str = "UPDATE users SET session_token = $1, last_login = now(), \
     updated_at = now() WHERE id = $2";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("{0}")]
    Validation(#[from] FieldValidationError),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LoginError> for AppError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::Validation(e) => AppError::Validation(e.to_string()),
            LoginError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".into())
            },
            LoginError::Database(e) => AppError::Database(e),
        }
    }
}

impl LoginCommand {
    pub fn validate(&self) -> Result<(), LoginError> {
        validate_email("email", &self.email)?;
        validate_required("password", &self.password, 1024)?;
        Ok(())
    }
}

#[tracing::instrument(skip(state, command), fields(email = %command.email))]
pub async fn handle(
    state: &FeatureState,
    command: LoginCommand,
) -> Result<LoginResponse, LoginError> {
    command.validate()?;

    let email = crate::features::shared::validation::normalize_email(&command.email);

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE lower(email) = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let mut user = user.ok_or(LoginError::InvalidCredentials)?;

    if !auth::verify_password(&command.password, &user.password_hash) {
        return Err(LoginError::InvalidCredentials);
    }

    let token = auth::generate_session_token();

    let obs = state.auditor.begin(
        UPDATE_SESSION,
        Params::new().push("id", user.id).push("session_token", "<redacted>"),
    );
    sqlx::query(UPDATE_SESSION)
        .bind(&token)
        .bind(user.id)
        .execute(&state.db)
        .await?;
    obs.finish(&state.db).await;

    user.session_token = Some(token.clone());

    tracing::info!(user_id = user.id, "User logged in");

    Ok(LoginResponse {
        token,
        user: UserView::from(&user),
    })
}
