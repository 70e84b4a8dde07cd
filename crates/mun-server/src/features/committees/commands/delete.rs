//! Delete a committee (cascades to its sessions and delegate assignments)

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::FeatureState;

const DELETE_COMMITTEE: &str = "DELETE FROM committees WHERE id = $1";

#[derive(Debug, thiserror::Error)]
pub enum DeleteCommitteeError {
    #[error("Committee with id {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<DeleteCommitteeError> for AppError {
    fn from(err: DeleteCommitteeError) -> Self {
        match err {
            DeleteCommitteeError::NotFound(id) => {
                AppError::NotFound(format!("Committee with id {} not found", id))
            },
            DeleteCommitteeError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn handle(state: &FeatureState, id: i64) -> Result<(), DeleteCommitteeError> {
    let obs = state
        .auditor
        .begin(DELETE_COMMITTEE, Params::new().push("id", id));
    let result = sqlx::query(DELETE_COMMITTEE)
        .bind(id)
        .execute(&state.db)
        .await?;
    obs.finish(&state.db).await;

    if result.rows_affected() == 0 {
        return Err(DeleteCommitteeError::NotFound(id));
    }

    tracing::info!(committee_id = id, "Committee deleted");
    Ok(())
}
