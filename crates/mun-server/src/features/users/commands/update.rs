//! Update user command
//!
//! Partial update: absent fields keep their stored values. An admin can also
//! reset the password back to the default via `resetPassword`.

use serde::Deserialize;

use crate::audit::params::Params;
use crate::auth;
use crate::error::AppError;
use crate::features::shared::validation::{
    normalize_email, validate_email, validate_required, FieldValidationError,
};
use crate::features::FeatureState;
use crate::models::{Role, UserRow, UserView};

const UPDATE_USER: &str = "UPDATE users SET name = $1, email = $2, role = $3, \
     organization = $4, phone = $5, password_hash = $6, updated_at = now() \
     WHERE id = $7 RETURNING *";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserCommand {
    #[serde(skip)]
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub reset_password: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateUserError {
    #[error("{0}")]
    Validation(#[from] FieldValidationError),
    #[error("{0}")]
    InvalidRole(String),
    #[error("User with id {0} not found")]
    NotFound(i64),
    #[error("A user with email '{0}' already exists")]
    EmailConflict(String),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<UpdateUserError> for AppError {
    fn from(err: UpdateUserError) -> Self {
        match err {
            UpdateUserError::Validation(e) => AppError::Validation(e.to_string()),
            UpdateUserError::InvalidRole(msg) => AppError::Validation(msg),
            UpdateUserError::NotFound(id) => {
                AppError::NotFound(format!("User with id {} not found", id))
            },
            UpdateUserError::EmailConflict(email) => {
                AppError::Conflict(format!("A user with email '{}' already exists", email))
            },
            UpdateUserError::Hashing(msg) => AppError::Internal(msg),
            UpdateUserError::Database(e) => AppError::Database(e),
        }
    }
}

impl UpdateUserCommand {
    pub fn validate(&self) -> Result<Option<Role>, UpdateUserError> {
        if let Some(ref name) = self.name {
            validate_required("name", name, 255)?;
        }
        if let Some(ref email) = self.email {
            validate_email("email", email)?;
        }
        match self.role {
            Some(ref role) => role
                .parse()
                .map(Some)
                .map_err(UpdateUserError::InvalidRole),
            None => Ok(None),
        }
    }
}

#[tracing::instrument(skip(state, command), fields(user_id = command.id))]
pub async fn handle(
    state: &FeatureState,
    command: UpdateUserCommand,
) -> Result<UserView, UpdateUserError> {
    let role = command.validate()?;

    let existing: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(command.id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or(UpdateUserError::NotFound(command.id))?;

    let name = command
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| existing.name.clone());
    let email = command
        .email
        .map(|e| normalize_email(&e))
        .unwrap_or_else(|| existing.email.clone());
    let role = role
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| existing.role.clone());
    let organization = command.organization.or_else(|| existing.organization.clone());
    let phone = command.phone.or_else(|| existing.phone.clone());

    let password_hash = if command.reset_password.unwrap_or(false) {
        auth::hash_password(auth::DEFAULT_PASSWORD)
            .map_err(|e| UpdateUserError::Hashing(e.to_string()))?
    } else {
        existing.password_hash.clone()
    };

    let obs = state.auditor.begin(
        UPDATE_USER,
        Params::new()
            .push("id", command.id)
            .push("email", email.clone())
            .push("role", role.clone()),
    );
    let row: UserRow = sqlx::query_as(UPDATE_USER)
        .bind(&name)
        .bind(&email)
        .bind(&role)
        .bind(&organization)
        .bind(&phone)
        .bind(&password_hash)
        .bind(command.id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return UpdateUserError::EmailConflict(email.clone());
                }
            }
            UpdateUserError::Database(e)
        })?;
    obs.finish(&state.db).await;

    tracing::info!(user_id = row.id, "User updated");

    Ok(UserView::from(&row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_validation() {
        let cmd = UpdateUserCommand {
            id: 1,
            name: None,
            email: None,
            role: None,
            organization: None,
            phone: None,
            reset_password: None,
        };
        assert!(cmd.validate().unwrap().is_none());

        let cmd = UpdateUserCommand {
            role: Some("chair".to_string()),
            ..cmd
        };
        assert_eq!(cmd.validate().unwrap(), Some(Role::Dais));
    }

    #[test]
    fn test_invalid_fields_rejected() {
        let cmd = UpdateUserCommand {
            id: 1,
            name: Some("  ".to_string()),
            email: None,
            role: None,
            organization: None,
            phone: None,
            reset_password: None,
        };
        assert!(matches!(cmd.validate(), Err(UpdateUserError::Validation(_))));

        let cmd = UpdateUserCommand {
            id: 1,
            name: None,
            email: Some("nope".to_string()),
            role: None,
            organization: None,
            phone: None,
            reset_password: None,
        };
        assert!(matches!(cmd.validate(), Err(UpdateUserError::Validation(_))));
    }
}
