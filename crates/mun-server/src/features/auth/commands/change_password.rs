//! Change password command

use serde::Deserialize;

use crate::audit::params::Params;
use crate::auth;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::models::UserRow;

const UPDATE_PASSWORD: &str =
    "UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ChangePasswordError {
    #[error("New password must be at least {0} characters")]
    TooShort(usize),
    #[error("Current password is incorrect")]
    WrongPassword,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ChangePasswordError> for AppError {
    fn from(err: ChangePasswordError) -> Self {
        match err {
            ChangePasswordError::TooShort(n) => {
                AppError::Validation(format!("New password must be at least {} characters", n))
            },
            ChangePasswordError::WrongPassword => {
                AppError::Forbidden("Current password is incorrect".into())
            },
            ChangePasswordError::Hashing(msg) => AppError::Internal(msg),
            ChangePasswordError::Database(e) => AppError::Database(e),
        }
    }
}

impl ChangePasswordCommand {
    pub fn validate(&self) -> Result<(), ChangePasswordError> {
        if self.new_password.chars().count() < auth::MIN_PASSWORD_LEN {
            return Err(ChangePasswordError::TooShort(auth::MIN_PASSWORD_LEN));
        }
        Ok(())
    }
}

#[tracing::instrument(skip(state, user, command), fields(user_id = user.id))]
pub async fn handle(
    state: &FeatureState,
    user: &UserRow,
    command: ChangePasswordCommand,
) -> Result<(), ChangePasswordError> {
    command.validate()?;

    if !auth::verify_password(&command.current_password, &user.password_hash) {
        return Err(ChangePasswordError::WrongPassword);
    }

    let hash = auth::hash_password(&command.new_password)
        .map_err(|e| ChangePasswordError::Hashing(e.to_string()))?;

    let obs = state.auditor.begin(
        UPDATE_PASSWORD,
        Params::new().push("id", user.id).push("password_hash", "<redacted>"),
    );
    sqlx::query(UPDATE_PASSWORD)
        .bind(&hash)
        .bind(user.id)
        .execute(&state.db)
        .await?;
    obs.finish(&state.db).await;

    tracing::info!(user_id = user.id, "Password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_password_length() {
        let cmd = ChangePasswordCommand {
            current_password: "123456".to_string(),
            new_password: "short".to_string(),
        };
        assert!(matches!(cmd.validate(), Err(ChangePasswordError::TooShort(_))));

        let cmd = ChangePasswordCommand {
            current_password: "123456".to_string(),
            new_password: "a-long-enough-password".to_string(),
        };
        assert!(cmd.validate().is_ok());
    }
}
