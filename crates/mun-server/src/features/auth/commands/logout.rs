//! Logout command
//!
//! Clears the session token matching the presented one. Logging out with a
//! missing or already-invalid token still succeeds.

use serde::Serialize;

use crate::audit::params::Params;
use crate::features::FeatureState;

const CLEAR_SESSION: &str =
    "UPDATE users SET session_token = NULL, updated_at = now() WHERE session_token = $1";

#[derive(Debug, Clone)]
pub struct LogoutCommand {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

#[tracing::instrument(skip(state, command))]
pub async fn handle(
    state: &FeatureState,
    command: LogoutCommand,
) -> Result<LogoutResponse, sqlx::Error> {
    let Some(token) = command.token else {
        return Ok(LogoutResponse { logged_out: false });
    };

    let obs = state.auditor.begin(
        CLEAR_SESSION,
        Params::new().push("session_token", "<redacted>"),
    );
    let result = sqlx::query(CLEAR_SESSION)
        .bind(&token)
        .execute(&state.db)
        .await?;
    obs.finish(&state.db).await;

    Ok(LogoutResponse {
        logged_out: result.rows_affected() > 0,
    })
}
