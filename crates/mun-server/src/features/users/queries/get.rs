//! Get a single user by id

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::{UserRow, UserView};

#[derive(Debug, thiserror::Error)]
pub enum GetUserError {
    #[error("User with id {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<GetUserError> for AppError {
    fn from(err: GetUserError) -> Self {
        match err {
            GetUserError::NotFound(id) => {
                AppError::NotFound(format!("User with id {} not found", id))
            },
            GetUserError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, id: i64) -> Result<UserView, GetUserError> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;

    row.map(|r| UserView::from(&r))
        .ok_or(GetUserError::NotFound(id))
}

/// Fetch the raw row, shared by the permission endpoints
pub async fn fetch_row(pool: &PgPool, id: i64) -> Result<UserRow, GetUserError> {
    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.ok_or(GetUserError::NotFound(id))
}
