//! Bulk user import from CSV
//!
//! Upserts by email: existing accounts are updated in place, new accounts are
//! created with the default password and role-default permissions. Row
//! failures are collected into the report and never abort the batch.

use crate::audit::params::Params;
use crate::auth::{self, permissions};
use crate::error::AppError;
use crate::features::shared::csv::{column_indices, decode_upload, field, ImportReport};
use crate::features::shared::validation::{normalize_email, validate_email, validate_required};
use crate::features::FeatureState;
use crate::models::Role;

pub const REQUIRED_COLUMNS: [&str; 5] = ["name", "email", "role", "organization", "phone"];

const INSERT_USER: &str = "INSERT INTO users \
     (name, email, password_hash, role, organization, phone, permissions) \
     VALUES ($1, $2, $3, $4, $5, $6, $7)";

const UPDATE_USER: &str = "UPDATE users SET name = $1, role = $2, organization = $3, \
     phone = $4, updated_at = now() WHERE id = $5";

#[derive(Debug, thiserror::Error)]
pub enum ImportUsersError {
    #[error("Missing required columns: {0}")]
    MissingColumns(String),
    #[error("CSV file is empty")]
    Empty,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ImportUsersError> for AppError {
    fn from(err: ImportUsersError) -> Self {
        match err {
            ImportUsersError::MissingColumns(cols) => {
                AppError::BadRequest(format!("Missing required columns: {}", cols))
            },
            ImportUsersError::Empty => AppError::BadRequest("CSV file is empty".into()),
            ImportUsersError::Hashing(msg) => AppError::Internal(msg),
            ImportUsersError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(state, bytes), fields(size = bytes.len()))]
pub async fn handle(state: &FeatureState, bytes: &[u8]) -> Result<ImportReport, ImportUsersError> {
    let text = decode_upload(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| ImportUsersError::Empty)?
        .clone();
    let indices = column_indices(&headers, &REQUIRED_COLUMNS)
        .map_err(|missing| ImportUsersError::MissingColumns(missing.join(", ")))?;

    // Default hash computed once; every imported account gets the same
    // starting password.
    let default_hash = auth::hash_password(auth::DEFAULT_PASSWORD)
        .map_err(|e| ImportUsersError::Hashing(e.to_string()))?;

    let mut report = ImportReport::default();

    for (index, record) in reader.records().enumerate() {
        // 1-based line numbers counting the header line.
        let line = index + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.row_error(line, format!("unreadable row: {}", e));
                continue;
            },
        };

        let name = field(&record, &indices, "name");
        let email_raw = field(&record, &indices, "email");
        let role_raw = field(&record, &indices, "role");
        let organization = field(&record, &indices, "organization");
        let phone = field(&record, &indices, "phone");

        if let Err(e) = validate_required("name", name, 255) {
            report.row_error(line, e);
            continue;
        }
        if let Err(e) = validate_email("email", email_raw) {
            report.row_error(line, e);
            continue;
        }
        let role: Role = match role_raw.parse() {
            Ok(role) => role,
            Err(e) => {
                report.row_error(line, e);
                continue;
            },
        };

        let email = normalize_email(email_raw);
        let organization = (!organization.is_empty()).then(|| organization.to_string());
        let phone = (!phone.is_empty()).then(|| phone.to_string());

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&state.db)
            .await?;

        match existing {
            Some(id) => {
                let obs = state.auditor.begin(
                    UPDATE_USER,
                    Params::new().push("id", id).push("email", email.clone()),
                );
                sqlx::query(UPDATE_USER)
                    .bind(name)
                    .bind(role.as_str())
                    .bind(&organization)
                    .bind(&phone)
                    .bind(id)
                    .execute(&state.db)
                    .await?;
                obs.finish(&state.db).await;
                report.updated += 1;
            },
            None => {
                let default_permissions =
                    serde_json::to_string(&permissions::default_permissions(role))
                        .unwrap_or_else(|_| "[]".to_string());
                let obs = state.auditor.begin(
                    INSERT_USER,
                    Params::new()
                        .push("email", email.clone())
                        .push("role", role.as_str()),
                );
                sqlx::query(INSERT_USER)
                    .bind(name)
                    .bind(&email)
                    .bind(&default_hash)
                    .bind(role.as_str())
                    .bind(&organization)
                    .bind(&phone)
                    .bind(&default_permissions)
                    .execute(&state.db)
                    .await?;
                obs.finish(&state.db).await;
                report.created += 1;
            },
        }
    }

    tracing::info!(
        created = report.created,
        updated = report.updated,
        errors = report.errors.len(),
        "User import completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::shared::csv::column_indices;

    #[test]
    fn test_missing_columns_listed() {
        let headers = csv::StringRecord::from(vec!["name", "email"]);
        let missing = column_indices(&headers, &REQUIRED_COLUMNS).unwrap_err();
        assert_eq!(missing, vec!["role", "organization", "phone"]);
    }

    #[test]
    fn test_missing_columns_maps_to_400() {
        let err: AppError = ImportUsersError::MissingColumns("role".into()).into();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
