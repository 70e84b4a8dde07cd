//! Delete a delegate assignment

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::FeatureState;

const DELETE_DELEGATE: &str = "DELETE FROM delegates WHERE id = $1";

#[derive(Debug, thiserror::Error)]
pub enum DeleteDelegateError {
    #[error("Delegate with id {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<DeleteDelegateError> for AppError {
    fn from(err: DeleteDelegateError) -> Self {
        match err {
            DeleteDelegateError::NotFound(id) => {
                AppError::NotFound(format!("Delegate with id {} not found", id))
            },
            DeleteDelegateError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(state))]
pub async fn handle(state: &FeatureState, id: i64) -> Result<(), DeleteDelegateError> {
    let obs = state
        .auditor
        .begin(DELETE_DELEGATE, Params::new().push("id", id));
    let result = sqlx::query(DELETE_DELEGATE)
        .bind(id)
        .execute(&state.db)
        .await?;
    obs.finish(&state.db).await;

    if result.rows_affected() == 0 {
        return Err(DeleteDelegateError::NotFound(id));
    }

    tracing::info!(delegate_id = id, "Delegate assignment deleted");
    Ok(())
}
