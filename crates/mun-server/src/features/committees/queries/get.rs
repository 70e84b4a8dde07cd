//! Fetch a single committee with its agenda sessions

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{CommitteeRow, CommitteeView};

#[derive(Debug, thiserror::Error)]
pub enum GetCommitteeError {
    #[error("Committee with id {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<GetCommitteeError> for AppError {
    fn from(err: GetCommitteeError) -> Self {
        match err {
            GetCommitteeError::NotFound(id) => {
                AppError::NotFound(format!("Committee with id {} not found", id))
            },
            GetCommitteeError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, id: i64) -> Result<CommitteeView, GetCommitteeError> {
    let row: Option<CommitteeRow> = sqlx::query_as("SELECT * FROM committees WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    let row = row.ok_or(GetCommitteeError::NotFound(id))?;

    let sessions = super::super::sessions_for(&pool, row.id).await?;
    Ok(CommitteeView::from_row(&row, sessions))
}
