//! Partial committee update
//!
//! Absent fields keep their stored values. The code stays unique and
//! uppercase; JSON columns are replaced wholesale when provided.

use serde::Deserialize;

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::models::{CommitteeRow, CommitteeView, DaisMember, TimeConfig};

use super::create::{map_unique, normalize_code, parse_status, CreateCommitteeError};

const UPDATE_COMMITTEE: &str = "UPDATE committees SET code = $1, name = $2, venue = $3, \
     description = $4, status = $5, capacity = $6, dais_json = $7, time_config = $8, \
     updated_at = now() WHERE id = $9 RETURNING *";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommitteeCommand {
    #[serde(skip)]
    pub id: i64,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub dais: Option<Vec<DaisMember>>,
    #[serde(default)]
    pub time_config: Option<TimeConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateCommitteeError {
    #[error("Committee with id {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Invalid(#[from] CreateCommitteeError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<UpdateCommitteeError> for AppError {
    fn from(err: UpdateCommitteeError) -> Self {
        match err {
            UpdateCommitteeError::NotFound(id) => {
                AppError::NotFound(format!("Committee with id {} not found", id))
            },
            UpdateCommitteeError::Invalid(inner) => inner.into(),
            UpdateCommitteeError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(state, command), fields(id = command.id))]
pub async fn handle(
    state: &FeatureState,
    command: UpdateCommitteeCommand,
) -> Result<CommitteeView, UpdateCommitteeError> {
    let existing: Option<CommitteeRow> = sqlx::query_as("SELECT * FROM committees WHERE id = $1")
        .bind(command.id)
        .fetch_optional(&state.db)
        .await?;
    let existing = existing.ok_or(UpdateCommitteeError::NotFound(command.id))?;

    let code = match command.code.as_deref() {
        Some(code) => normalize_code(code)?,
        None => existing.code.clone(),
    };
    let name = match command.name.as_deref() {
        Some(name) => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(CreateCommitteeError::Validation("name is required".into()).into());
            }
            name
        },
        None => existing.name.clone(),
    };
    let status = match parse_status(command.status.as_deref())? {
        Some(status) => status.as_str().to_string(),
        None => existing.status.clone(),
    };
    let capacity = match command.capacity {
        Some(capacity) if capacity <= 0 => {
            return Err(CreateCommitteeError::Validation(
                "capacity must be greater than zero".into(),
            )
            .into());
        },
        Some(capacity) => capacity,
        None => existing.capacity,
    };
    let venue = command
        .venue
        .as_deref()
        .map(|v| v.trim().to_string())
        .or(existing.venue);
    let description = command.description.or(existing.description);
    let dais_json = match command.dais.as_ref() {
        Some(dais) => Some(serde_json::to_value(dais).map_err(|e| {
            CreateCommitteeError::Validation(format!("invalid dais list: {}", e))
        })?),
        None => existing.dais_json,
    };
    let time_config = match command.time_config.as_ref() {
        Some(config) => Some(serde_json::to_value(config).map_err(|e| {
            CreateCommitteeError::Validation(format!("invalid timeConfig: {}", e))
        })?),
        None => existing.time_config,
    };

    let obs = state.auditor.begin(
        UPDATE_COMMITTEE,
        Params::new()
            .push("id", command.id)
            .push("code", code.clone())
            .push("status", status.clone()),
    );
    let row: CommitteeRow = sqlx::query_as(UPDATE_COMMITTEE)
        .bind(&code)
        .bind(&name)
        .bind(venue)
        .bind(description)
        .bind(&status)
        .bind(capacity)
        .bind(dais_json)
        .bind(time_config)
        .bind(command.id)
        .fetch_one(&state.db)
        .await
        .map_err(|e| UpdateCommitteeError::Invalid(map_unique(e, &code)))?;
    obs.finish(&state.db).await;

    tracing::info!(committee_id = row.id, "Committee updated");

    let sessions = super::super::sessions_for(&state.db, row.id).await?;
    Ok(CommitteeView::from_row(&row, sessions))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_payload_deserializes() {
        let command: UpdateCommitteeCommand =
            serde_json::from_str(r#"{"status": "paused"}"#).unwrap();
        assert_eq!(command.status.as_deref(), Some("paused"));
        assert!(command.code.is_none());
        assert!(command.dais.is_none());
    }

    #[test]
    fn test_invalid_status_maps_to_400() {
        let err: AppError =
            UpdateCommitteeError::Invalid(CreateCommitteeError::Validation("x".into())).into();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
