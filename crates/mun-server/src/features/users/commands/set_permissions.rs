//! Replace a user's permission override
//!
//! A non-empty list replaces the role defaults entirely; an empty list
//! removes the override and restores them.

use serde::Deserialize;

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::models::{UserRow, UserView};

const UPDATE_PERMISSIONS: &str =
    "UPDATE users SET permissions = $1, updated_at = now() WHERE id = $2 RETURNING *";

#[derive(Debug, Clone, Deserialize)]
pub struct SetPermissionsCommand {
    #[serde(skip)]
    pub id: i64,
    pub permissions: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SetPermissionsError {
    #[error("Permission entries must be non-blank strings")]
    BlankEntry,
    #[error("User with id {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<SetPermissionsError> for AppError {
    fn from(err: SetPermissionsError) -> Self {
        match err {
            SetPermissionsError::BlankEntry => {
                AppError::Validation("Permission entries must be non-blank strings".into())
            },
            SetPermissionsError::NotFound(id) => {
                AppError::NotFound(format!("User with id {} not found", id))
            },
            SetPermissionsError::Database(e) => AppError::Database(e),
        }
    }
}

impl SetPermissionsCommand {
    pub fn validate(&self) -> Result<(), SetPermissionsError> {
        if self.permissions.iter().any(|p| p.trim().is_empty()) {
            return Err(SetPermissionsError::BlankEntry);
        }
        Ok(())
    }
}

#[tracing::instrument(skip(state, command), fields(user_id = command.id))]
pub async fn handle(
    state: &FeatureState,
    command: SetPermissionsCommand,
) -> Result<UserView, SetPermissionsError> {
    command.validate()?;

    let stored: Vec<String> = command
        .permissions
        .iter()
        .map(|p| p.trim().to_string())
        .collect();
    let serialized = serde_json::to_string(&stored).unwrap_or_else(|_| "[]".to_string());

    let obs = state.auditor.begin(
        UPDATE_PERMISSIONS,
        Params::new()
            .push("id", command.id)
            .push("permissions", serialized.clone()),
    );
    let row: Option<UserRow> = sqlx::query_as(UPDATE_PERMISSIONS)
        .bind(&serialized)
        .bind(command.id)
        .fetch_optional(&state.db)
        .await?;
    let row = row.ok_or(SetPermissionsError::NotFound(command.id))?;
    obs.finish(&state.db).await;

    tracing::info!(user_id = row.id, count = stored.len(), "Permission override replaced");

    Ok(UserView::from(&row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_entries_rejected() {
        let cmd = SetPermissionsCommand {
            id: 1,
            permissions: vec!["logs:read".to_string(), "  ".to_string()],
        };
        assert!(matches!(cmd.validate(), Err(SetPermissionsError::BlankEntry)));
    }

    #[test]
    fn test_empty_list_is_valid() {
        let cmd = SetPermissionsCommand {
            id: 1,
            permissions: vec![],
        };
        assert!(cmd.validate().is_ok());
    }
}
