//! Add an agenda session to a committee
//!
//! The start time is an optional ISO8601 string. A trailing `Z` or an offset
//! is honored; a bare local timestamp is taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::FeatureState;
use crate::models::{CommitteeSessionRow, CommitteeSessionView};

pub const DEFAULT_DURATION_MINUTES: i32 = 30;

const INSERT_SESSION: &str = "INSERT INTO committee_sessions \
     (committee_id, topic, chair, start_time, duration_minutes) \
     VALUES ($1, $2, $3, $4, $5) RETURNING *";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AddSessionCommand {
    #[serde(skip)]
    pub committee_id: i64,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub chair: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddSessionError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Committee with id {0} not found")]
    CommitteeNotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<AddSessionError> for AppError {
    fn from(err: AddSessionError) -> Self {
        match err {
            AddSessionError::Validation(msg) => AppError::Validation(msg),
            AddSessionError::CommitteeNotFound(id) => {
                AppError::NotFound(format!("Committee with id {} not found", id))
            },
            AddSessionError::Database(e) => AppError::Database(e),
        }
    }
}

impl AddSessionCommand {
    pub fn validate(&self) -> Result<(String, Option<DateTime<Utc>>, i32), AddSessionError> {
        let topic = self
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AddSessionError::Validation("topic is required".into()))?
            .to_string();

        let start = self
            .start
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_start)
            .transpose()?;

        let duration = match self.duration_minutes {
            None => DEFAULT_DURATION_MINUTES,
            Some(minutes) if minutes > 0 => minutes,
            Some(_) => {
                return Err(AddSessionError::Validation(
                    "durationMinutes must be greater than zero".into(),
                ));
            },
        };

        Ok((topic, start, duration))
    }
}

fn parse_start(value: &str) -> Result<DateTime<Utc>, AddSessionError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(AddSessionError::Validation(format!(
        "start is not a recognized ISO8601 timestamp: '{}'",
        value
    )))
}

#[tracing::instrument(skip(state, command), fields(committee_id = command.committee_id))]
pub async fn handle(
    state: &FeatureState,
    command: AddSessionCommand,
) -> Result<CommitteeSessionView, AddSessionError> {
    let (topic, start, duration) = command.validate()?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM committees WHERE id = $1)")
        .bind(command.committee_id)
        .fetch_one(&state.db)
        .await?;
    if !exists {
        return Err(AddSessionError::CommitteeNotFound(command.committee_id));
    }

    let chair = command
        .chair
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let obs = state.auditor.begin(
        INSERT_SESSION,
        Params::new()
            .push("committee_id", command.committee_id)
            .push("topic", topic.clone()),
    );
    let row: CommitteeSessionRow = sqlx::query_as(INSERT_SESSION)
        .bind(command.committee_id)
        .bind(&topic)
        .bind(chair)
        .bind(start)
        .bind(duration)
        .fetch_one(&state.db)
        .await?;
    obs.finish(&state.db).await;

    tracing::info!(session_id = row.id, committee_id = row.committee_id, "Agenda session added");

    Ok(CommitteeSessionView::from(&row))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_required() {
        let command = AddSessionCommand::default();
        assert!(matches!(
            command.validate(),
            Err(AddSessionError::Validation(_))
        ));
    }

    #[test]
    fn test_duration_defaults_to_thirty() {
        let command = AddSessionCommand {
            topic: Some("Opening debate".to_string()),
            ..Default::default()
        };
        let (_, _, duration) = command.validate().unwrap();
        assert_eq!(duration, DEFAULT_DURATION_MINUTES);
    }

    #[test]
    fn test_duration_must_be_positive() {
        let command = AddSessionCommand {
            topic: Some("Opening debate".to_string()),
            duration_minutes: Some(0),
            ..Default::default()
        };
        assert!(command.validate().is_err());
    }

    #[test]
    fn test_start_accepts_trailing_z() {
        let parsed = parse_start("2026-03-01T09:00:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T09:00:00+00:00");
    }

    #[test]
    fn test_start_accepts_bare_timestamp_as_utc() {
        let parsed = parse_start("2026-03-01 09:00:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T09:00:00+00:00");
    }

    #[test]
    fn test_start_rejects_garbage() {
        assert!(parse_start("next tuesday").is_err());
    }
}
