//! Read a user's effective permissions

use serde::Serialize;
use sqlx::PgPool;

use crate::auth::permissions::effective_permissions;

use super::get::{fetch_row, GetUserError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsResponse {
    pub user_id: i64,
    pub role: String,
    /// Whether a stored override is in effect (as opposed to role defaults)
    pub overridden: bool,
    pub permissions: Vec<String>,
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool, id: i64) -> Result<PermissionsResponse, GetUserError> {
    let row = fetch_row(&pool, id).await?;

    Ok(PermissionsResponse {
        user_id: row.id,
        role: row.role.clone(),
        overridden: row.permission_override().is_some(),
        permissions: effective_permissions(&row),
    })
}
