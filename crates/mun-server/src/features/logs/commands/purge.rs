//! Purge the audit trail
//!
//! The DELETE runs under suppression so it never observes itself. Afterwards
//! a single manual LOG_PURGE record carrying the deleted count is written, so
//! the purge itself stays accountable.

use serde::Serialize;
use serde_json::json;

use crate::audit::scope;
use crate::features::FeatureState;

#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub deleted: u64,
}

#[tracing::instrument(skip(state))]
pub async fn handle(state: &FeatureState, actor_id: i64) -> Result<PurgeResponse, sqlx::Error> {
    let deleted = {
        let _guard = scope::suppress();
        sqlx::query("DELETE FROM logs")
            .execute(&state.db)
            .await?
            .rows_affected()
    };

    state
        .auditor
        .log_manual(
            &state.db,
            Some(actor_id),
            "LOG_PURGE",
            Some("logs"),
            json!({ "deleted": deleted }),
        )
        .await;

    tracing::warn!(deleted, actor_id, "Audit log purged");

    Ok(PurgeResponse { deleted })
}
