//! List all committees with their agenda sessions, ordered by code

use std::collections::HashMap;

use sqlx::PgPool;

use crate::models::{CommitteeRow, CommitteeSessionRow, CommitteeSessionView, CommitteeView};

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool) -> Result<Vec<CommitteeView>, sqlx::Error> {
    let rows: Vec<CommitteeRow> = sqlx::query_as("SELECT * FROM committees ORDER BY code ASC")
        .fetch_all(&pool)
        .await?;

    // One query for all sessions, grouped in memory.
    let session_rows: Vec<CommitteeSessionRow> = sqlx::query_as(
        "SELECT * FROM committee_sessions ORDER BY start_time ASC NULLS LAST, id ASC",
    )
    .fetch_all(&pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<CommitteeSessionView>> = HashMap::new();
    for session in &session_rows {
        grouped
            .entry(session.committee_id)
            .or_default()
            .push(CommitteeSessionView::from(session));
    }

    Ok(rows
        .iter()
        .map(|row| {
            let sessions = grouped.remove(&row.id).unwrap_or_default();
            CommitteeView::from_row(row, sessions)
        })
        .collect())
}
