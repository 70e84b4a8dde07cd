//! Committee ("venue") feature (presidium)
//!
//! A committee carries its dais roster and clock configuration as JSON
//! columns and owns a list of agenda sessions. Deleting a committee cascades
//! to its sessions and delegate assignments.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::venues_routes;

use sqlx::PgPool;

use crate::models::{CommitteeSessionRow, CommitteeSessionView};

/// Agenda sessions of one committee, in start order with unscheduled ones
/// last.
pub(crate) async fn sessions_for(
    pool: &PgPool,
    committee_id: i64,
) -> Result<Vec<CommitteeSessionView>, sqlx::Error> {
    let rows: Vec<CommitteeSessionRow> = sqlx::query_as(
        "SELECT * FROM committee_sessions WHERE committee_id = $1 \
         ORDER BY start_time ASC NULLS LAST, id ASC",
    )
    .bind(committee_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(CommitteeSessionView::from).collect())
}
