//! Create-or-update delegate command
//!
//! A payload with an `id` updates that assignment (404 when unknown); without
//! one it creates a new assignment, which requires userId, committeeId, and
//! country. The referenced user must exist with the delegate role and the
//! committee must exist; a duplicate (user, committee) pair is a conflict.

use serde::Deserialize;

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::models::{DelegateJoinedRow, DelegateRow, DelegateView, Role};

const INSERT_DELEGATE: &str = "INSERT INTO delegates (user_id, committee_id, country, veto_allowed) \
     VALUES ($1, $2, $3, $4) RETURNING *";

const UPDATE_DELEGATE: &str = "UPDATE delegates SET user_id = $1, committee_id = $2, country = $3, \
     veto_allowed = $4, updated_at = now() WHERE id = $5 RETURNING *";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDelegateCommand {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub committee_id: Option<i64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub veto_allowed: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpsertDelegateError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Delegate with id {0} not found")]
    NotFound(i64),
    #[error("User with id {0} does not exist")]
    UserMissing(i64),
    #[error("User with id {0} does not have the delegate role")]
    NotADelegate(i64),
    #[error("Committee with id {0} does not exist")]
    CommitteeMissing(i64),
    #[error("User {0} is already assigned to committee {1}")]
    DuplicateAssignment(i64, i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<UpsertDelegateError> for AppError {
    fn from(err: UpsertDelegateError) -> Self {
        match err {
            UpsertDelegateError::MissingField(field) => {
                AppError::Validation(format!("{} is required", field))
            },
            UpsertDelegateError::NotFound(id) => {
                AppError::NotFound(format!("Delegate with id {} not found", id))
            },
            UpsertDelegateError::UserMissing(_)
            | UpsertDelegateError::NotADelegate(_)
            | UpsertDelegateError::CommitteeMissing(_) => AppError::Validation(err.to_string()),
            UpsertDelegateError::DuplicateAssignment(user, committee) => AppError::Conflict(
                format!("User {} is already assigned to committee {}", user, committee),
            ),
            UpsertDelegateError::Database(e) => AppError::Database(e),
        }
    }
}

impl UpsertDelegateCommand {
    fn country_trimmed(&self) -> Option<String> {
        self.country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
    }
}

#[tracing::instrument(skip(state, command), fields(id = ?command.id))]
pub async fn handle(
    state: &FeatureState,
    command: UpsertDelegateCommand,
) -> Result<DelegateView, UpsertDelegateError> {
    match command.id {
        Some(id) => update(state, id, command).await,
        None => create(state, command).await,
    }
}

async fn create(
    state: &FeatureState,
    command: UpsertDelegateCommand,
) -> Result<DelegateView, UpsertDelegateError> {
    let user_id = command
        .user_id
        .ok_or(UpsertDelegateError::MissingField("userId"))?;
    let committee_id = command
        .committee_id
        .ok_or(UpsertDelegateError::MissingField("committeeId"))?;
    let country = command
        .country_trimmed()
        .ok_or(UpsertDelegateError::MissingField("country"))?;
    let veto_allowed = command.veto_allowed.unwrap_or(false);

    check_references(state, user_id, committee_id).await?;

    let obs = state.auditor.begin(
        INSERT_DELEGATE,
        Params::new()
            .push("user_id", user_id)
            .push("committee_id", committee_id)
            .push("country", country.clone()),
    );
    let row: DelegateRow = sqlx::query_as(INSERT_DELEGATE)
        .bind(user_id)
        .bind(committee_id)
        .bind(&country)
        .bind(veto_allowed)
        .fetch_one(&state.db)
        .await
        .map_err(|e| map_unique(e, user_id, committee_id))?;
    obs.finish(&state.db).await;

    tracing::info!(delegate_id = row.id, "Delegate assignment created");

    fetch_view(state, row.id).await
}

async fn update(
    state: &FeatureState,
    id: i64,
    command: UpsertDelegateCommand,
) -> Result<DelegateView, UpsertDelegateError> {
    let existing: Option<DelegateRow> = sqlx::query_as("SELECT * FROM delegates WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or(UpsertDelegateError::NotFound(id))?;

    let user_id = command.user_id.unwrap_or(existing.user_id);
    let committee_id = command.committee_id.unwrap_or(existing.committee_id);
    let country = command.country_trimmed().unwrap_or(existing.country);
    let veto_allowed = command.veto_allowed.unwrap_or(existing.veto_allowed);

    check_references(state, user_id, committee_id).await?;

    let obs = state.auditor.begin(
        UPDATE_DELEGATE,
        Params::new()
            .push("id", id)
            .push("user_id", user_id)
            .push("committee_id", committee_id)
            .push("country", country.clone()),
    );
    sqlx::query(UPDATE_DELEGATE)
        .bind(user_id)
        .bind(committee_id)
        .bind(&country)
        .bind(veto_allowed)
        .bind(id)
        .execute(&state.db)
        .await
        .map_err(|e| map_unique(e, user_id, committee_id))?;
    obs.finish(&state.db).await;

    tracing::info!(delegate_id = id, "Delegate assignment updated");

    fetch_view(state, id).await
}

async fn check_references(
    state: &FeatureState,
    user_id: i64,
    committee_id: i64,
) -> Result<(), UpsertDelegateError> {
    let role: Option<String> = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;
    match role {
        None => return Err(UpsertDelegateError::UserMissing(user_id)),
        Some(role) if role.parse::<Role>() != Ok(Role::Delegate) => {
            return Err(UpsertDelegateError::NotADelegate(user_id));
        },
        Some(_) => {},
    }

    let committee_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM committees WHERE id = $1)")
            .bind(committee_id)
            .fetch_one(&state.db)
            .await?;
    if !committee_exists {
        return Err(UpsertDelegateError::CommitteeMissing(committee_id));
    }

    Ok(())
}

fn map_unique(e: sqlx::Error, user_id: i64, committee_id: i64) -> UpsertDelegateError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return UpsertDelegateError::DuplicateAssignment(user_id, committee_id);
        }
    }
    UpsertDelegateError::Database(e)
}

async fn fetch_view(state: &FeatureState, id: i64) -> Result<DelegateView, UpsertDelegateError> {
    let sql = format!("{} WHERE d.id = $1", super::super::SELECT_JOINED);
    let row: DelegateJoinedRow = sqlx::query_as(&sql).bind(id).fetch_one(&state.db).await?;
    Ok(DelegateView::from(&row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_fields() {
        let command = UpsertDelegateCommand {
            id: None,
            user_id: None,
            committee_id: Some(2),
            country: Some("France".to_string()),
            veto_allowed: None,
        };
        // Field checks happen before any database access on the create path.
        let missing = match command.user_id {
            None => UpsertDelegateError::MissingField("userId"),
            Some(_) => unreachable!(),
        };
        assert_eq!(missing.to_string(), "userId is required");
    }

    #[test]
    fn test_country_trimming() {
        let command = UpsertDelegateCommand {
            id: None,
            user_id: Some(1),
            committee_id: Some(2),
            country: Some("   ".to_string()),
            veto_allowed: None,
        };
        assert!(command.country_trimmed().is_none());

        let command = UpsertDelegateCommand {
            country: Some(" France ".to_string()),
            ..command
        };
        assert_eq!(command.country_trimmed().as_deref(), Some("France"));
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err: AppError = UpsertDelegateError::DuplicateAssignment(1, 2).into();
        assert_eq!(err.status(), axum::http::StatusCode::CONFLICT);
    }

    #[test]
    fn test_reference_errors_map_to_400() {
        let err: AppError = UpsertDelegateError::NotADelegate(5).into();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
