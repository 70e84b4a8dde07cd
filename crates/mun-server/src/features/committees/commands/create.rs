//! Create committee command

use serde::Deserialize;

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::models::{CommitteeRow, CommitteeStatus, CommitteeView, DaisMember, TimeConfig};

pub const MAX_CODE_LEN: usize = 10;

pub const DEFAULT_CAPACITY: i32 = 40;

const INSERT_COMMITTEE: &str = "INSERT INTO committees \
     (code, name, venue, description, status, capacity, dais_json, time_config, created_by) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommitteeCommand {
    pub code: String,
    pub name: String,
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
pub enum CreateCommitteeError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Committee code '{0}' is already in use")]
    CodeConflict(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CreateCommitteeError> for AppError {
    fn from(err: CreateCommitteeError) -> Self {
        match err {
            CreateCommitteeError::Validation(msg) => AppError::Validation(msg),
            CreateCommitteeError::CodeConflict(code) => {
                AppError::Conflict(format!("Committee code '{}' is already in use", code))
            },
            CreateCommitteeError::Database(e) => AppError::Database(e),
        }
    }
}

impl CreateCommitteeCommand {
    /// Validates the payload and returns the normalized (code, name, status)
    /// triple.
    pub fn validate(&self) -> Result<(String, String, CommitteeStatus), CreateCommitteeError> {
        let code = normalize_code(&self.code)?;
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CreateCommitteeError::Validation("name is required".into()));
        }
        let status = parse_status(self.status.as_deref())?
            .unwrap_or(CommitteeStatus::Preparation);
        if let Some(capacity) = self.capacity {
            if capacity <= 0 {
                return Err(CreateCommitteeError::Validation(
                    "capacity must be greater than zero".into(),
                ));
            }
        }
        Ok((code, name, status))
    }
}

pub(super) fn normalize_code(code: &str) -> Result<String, CreateCommitteeError> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return Err(CreateCommitteeError::Validation("code is required".into()));
    }
    if code.chars().count() > MAX_CODE_LEN {
        return Err(CreateCommitteeError::Validation(format!(
            "code must be at most {} characters",
            MAX_CODE_LEN
        )));
    }
    Ok(code)
}

pub(super) fn parse_status(
    status: Option<&str>,
) -> Result<Option<CommitteeStatus>, CreateCommitteeError> {
    match status {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(CreateCommitteeError::Validation),
    }
}

#[tracing::instrument(skip(state, command), fields(code = %command.code))]
pub async fn handle(
    state: &FeatureState,
    command: CreateCommitteeCommand,
    created_by: i64,
) -> Result<CommitteeView, CreateCommitteeError> {
    let (code, name, status) = command.validate()?;
    let capacity = command.capacity.unwrap_or(DEFAULT_CAPACITY);
    let dais_json = command
        .dais
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| CreateCommitteeError::Validation(format!("invalid dais list: {}", e)))?;
    let time_config = command
        .time_config
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| CreateCommitteeError::Validation(format!("invalid timeConfig: {}", e)))?;

    let obs = state.auditor.begin(
        INSERT_COMMITTEE,
        Params::new()
            .push("code", code.clone())
            .push("name", name.clone())
            .push("status", status.as_str()),
    );
    let row: CommitteeRow = sqlx::query_as(INSERT_COMMITTEE)
        .bind(&code)
        .bind(&name)
        .bind(command.venue.as_deref().map(str::trim))
        .bind(command.description.as_deref())
        .bind(status.as_str())
        .bind(capacity)
        .bind(dais_json)
        .bind(time_config)
        .bind(created_by)
        .fetch_one(&state.db)
        .await
        .map_err(|e| map_unique(e, &code))?;
    obs.finish(&state.db).await;

    tracing::info!(committee_id = row.id, code = %row.code, "Committee created");

    Ok(CommitteeView::from_row(&row, Vec::new()))
}

pub(super) fn map_unique(e: sqlx::Error, code: &str) -> CreateCommitteeError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return CreateCommitteeError::CodeConflict(code.to_string());
        }
    }
    CreateCommitteeError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(code: &str, name: &str) -> CreateCommitteeCommand {
        CreateCommitteeCommand {
            code: code.to_string(),
            name: name.to_string(),
            venue: None,
            description: None,
            status: None,
            capacity: None,
            dais: None,
            time_config: None,
        }
    }

    #[test]
    fn test_code_uppercased_and_bounded() {
        let (code, _, _) = command(" sc ", "Security Council").validate().unwrap();
        assert_eq!(code, "SC");

        let err = command("TOOLONGCODE1", "x").validate().unwrap_err();
        assert!(err.to_string().contains("at most 10"));
    }

    #[test]
    fn test_name_required() {
        let err = command("SC", "  ").validate().unwrap_err();
        assert!(matches!(err, CreateCommitteeError::Validation(_)));
    }

    #[test]
    fn test_status_validated() {
        let mut cmd = command("SC", "Security Council");
        cmd.status = Some("in_session".to_string());
        let (_, _, status) = cmd.validate().unwrap();
        assert_eq!(status, CommitteeStatus::InSession);

        let mut cmd = command("SC", "Security Council");
        cmd.status = Some("open".to_string());
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_capacity_positive() {
        let mut cmd = command("SC", "Security Council");
        cmd.capacity = Some(0);
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_payload_deserializes_dais_and_time_config() {
        let cmd: CreateCommitteeCommand = serde_json::from_str(
            r#"{
                "code": "sc",
                "name": "Security Council",
                "dais": [{"id": 3, "role": "chair"}],
                "timeConfig": {"realTimeAnchor": "2026-03-01T09:00:00Z", "flowSpeed": 2.0}
            }"#,
        )
        .unwrap();
        assert_eq!(cmd.dais.as_ref().map(|d| d.len()), Some(1));
        assert_eq!(cmd.time_config.as_ref().map(|t| t.flow_speed), Some(2.0));
    }
}
