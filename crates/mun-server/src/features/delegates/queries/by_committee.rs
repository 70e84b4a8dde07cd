//! Delegates of a single committee, ordered by country

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{DelegateJoinedRow, DelegateView};

#[derive(Debug, thiserror::Error)]
pub enum CommitteeDelegatesError {
    #[error("Committee with id {0} not found")]
    CommitteeNotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<CommitteeDelegatesError> for AppError {
    fn from(err: CommitteeDelegatesError) -> Self {
        match err {
            CommitteeDelegatesError::CommitteeNotFound(id) => {
                AppError::NotFound(format!("Committee with id {} not found", id))
            },
            CommitteeDelegatesError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(pool), fields(committee_id = committee_id))]
pub async fn handle(
    pool: PgPool,
    committee_id: i64,
) -> Result<Vec<DelegateView>, CommitteeDelegatesError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM committees WHERE id = $1)")
        .bind(committee_id)
        .fetch_one(&pool)
        .await?;
    if !exists {
        return Err(CommitteeDelegatesError::CommitteeNotFound(committee_id));
    }

    let sql = format!(
        "{} WHERE d.committee_id = $1 ORDER BY d.country ASC, d.id ASC",
        super::super::SELECT_JOINED
    );
    let rows: Vec<DelegateJoinedRow> = sqlx::query_as(&sql)
        .bind(committee_id)
        .fetch_all(&pool)
        .await?;

    Ok(rows.iter().map(DelegateView::from).collect())
}
