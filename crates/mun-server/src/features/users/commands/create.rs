//! Create user command
//!
//! New accounts start with the default password and the default permission
//! grant for their role.

use serde::Deserialize;

use crate::audit::params::Params;
use crate::auth::{self, permissions};
use crate::error::AppError;
use crate::features::shared::validation::{
    normalize_email, validate_email, validate_required, FieldValidationError,
};
use crate::features::FeatureState;
use crate::models::{Role, UserRow, UserView};

const INSERT_USER: &str = "INSERT INTO users \
     (name, email, password_hash, role, organization, phone, permissions) \
     VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserCommand {
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("{0}")]
    Validation(#[from] FieldValidationError),
    #[error("{0}")]
    InvalidRole(String),
    #[error("A user with email '{0}' already exists")]
    EmailConflict(String),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CreateUserError> for AppError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::Validation(e) => AppError::Validation(e.to_string()),
            CreateUserError::InvalidRole(msg) => AppError::Validation(msg),
            CreateUserError::EmailConflict(email) => {
                AppError::Conflict(format!("A user with email '{}' already exists", email))
            },
            CreateUserError::Hashing(msg) => AppError::Internal(msg),
            CreateUserError::Database(e) => AppError::Database(e),
        }
    }
}

impl CreateUserCommand {
    pub fn validate(&self) -> Result<Role, CreateUserError> {
        validate_required("name", &self.name, 255)?;
        validate_email("email", &self.email)?;
        self.role.parse().map_err(CreateUserError::InvalidRole)
    }
}

#[tracing::instrument(skip(state, command), fields(email = %command.email))]
pub async fn handle(
    state: &FeatureState,
    command: CreateUserCommand,
) -> Result<UserView, CreateUserError> {
    let role = command.validate()?;

    let email = normalize_email(&command.email);
    let password_hash = auth::hash_password(auth::DEFAULT_PASSWORD)
        .map_err(|e| CreateUserError::Hashing(e.to_string()))?;
    let default_permissions = serde_json::to_string(&permissions::default_permissions(role))
        .unwrap_or_else(|_| "[]".to_string());

    let obs = state.auditor.begin(
        INSERT_USER,
        Params::new()
            .push("name", command.name.trim())
            .push("email", email.clone())
            .push("role", role.as_str()),
    );
    let row: UserRow = sqlx::query_as(INSERT_USER)
        .bind(command.name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(command.organization.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(command.phone.as_deref().filter(|s| !s.trim().is_empty()))
        .bind(&default_permissions)
        .fetch_one(&state.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return CreateUserError::EmailConflict(email.clone());
                }
            }
            CreateUserError::Database(e)
        })?;
    obs.finish(&state.db).await;

    tracing::info!(user_id = row.id, role = %row.role, "User created");

    Ok(UserView::from(&row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(name: &str, email: &str, role: &str) -> CreateUserCommand {
        CreateUserCommand {
            name: name.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            organization: None,
            phone: None,
        }
    }

    #[test]
    fn test_validation_success() {
        assert_eq!(
            command("Ana", "ana@example.org", "delegate").validate().unwrap(),
            Role::Delegate
        );
    }

    #[test]
    fn test_chair_normalizes_to_dais() {
        assert_eq!(
            command("Ana", "ana@example.org", "chair").validate().unwrap(),
            Role::Dais
        );
    }

    #[test]
    fn test_validation_failures() {
        assert!(matches!(
            command("", "ana@example.org", "delegate").validate(),
            Err(CreateUserError::Validation(_))
        ));
        assert!(matches!(
            command("Ana", "bad-email", "delegate").validate(),
            Err(CreateUserError::Validation(_))
        ));
        assert!(matches!(
            command("Ana", "ana@example.org", "president").validate(),
            Err(CreateUserError::InvalidRole(_))
        ));
    }
}
