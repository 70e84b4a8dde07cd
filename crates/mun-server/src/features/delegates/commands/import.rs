//! Bulk delegate import from CSV
//!
//! Upserts by (user, committee): an existing assignment gets its country and
//! veto flag updated, otherwise a new one is created. Every row is validated
//! referentially (user exists with delegate role, committee code exists);
//! failures are reported per row and never abort the batch.

use std::collections::HashMap;

use crate::audit::params::Params;
use crate::error::AppError;
use crate::features::shared::csv::{column_indices, decode_upload, field, ImportReport};
use crate::features::shared::validation::{normalize_email, parse_truthy};
use crate::features::FeatureState;
use crate::models::Role;

pub const REQUIRED_COLUMNS: [&str; 3] = ["userEmail", "committeeCode", "country"];

const INSERT_DELEGATE: &str = "INSERT INTO delegates (user_id, committee_id, country, veto_allowed) \
     VALUES ($1, $2, $3, $4)";

const UPDATE_DELEGATE: &str = "UPDATE delegates SET country = $1, veto_allowed = $2, \
     updated_at = now() WHERE id = $3";

#[derive(Debug, thiserror::Error)]
pub enum ImportDelegatesError {
    #[error("Missing required columns: {0}")]
    MissingColumns(String),
    #[error("CSV file is empty")]
    Empty,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ImportDelegatesError> for AppError {
    fn from(err: ImportDelegatesError) -> Self {
        match err {
            ImportDelegatesError::MissingColumns(cols) => {
                AppError::BadRequest(format!("Missing required columns: {}", cols))
            },
            ImportDelegatesError::Empty => AppError::BadRequest("CSV file is empty".into()),
            ImportDelegatesError::Database(e) => AppError::Database(e),
        }
    }
}

#[tracing::instrument(skip(state, bytes), fields(size = bytes.len()))]
pub async fn handle(
    state: &FeatureState,
    bytes: &[u8],
) -> Result<ImportReport, ImportDelegatesError> {
    let text = decode_upload(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| ImportDelegatesError::Empty)?
        .clone();
    let indices = column_indices(&headers, &REQUIRED_COLUMNS)
        .map_err(|missing| ImportDelegatesError::MissingColumns(missing.join(", ")))?;

    let mut report = ImportReport::default();

    // Per-file lookup caches; imports repeat the same committees constantly.
    let mut committee_cache: HashMap<String, Option<i64>> = HashMap::new();

    for (index, record) in reader.records().enumerate() {
        let line = index + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report.row_error(line, format!("unreadable row: {}", e));
                continue;
            },
        };

        let email_raw = field(&record, &indices, "userEmail");
        let code_raw = field(&record, &indices, "committeeCode");
        let country = field(&record, &indices, "country");
        let veto_allowed = parse_truthy(field(&record, &indices, "vetoAllowed"));

        if email_raw.is_empty() {
            report.row_error(line, "userEmail is required");
            continue;
        }
        if code_raw.is_empty() {
            report.row_error(line, "committeeCode is required");
            continue;
        }
        if country.is_empty() {
            report.row_error(line, "country is required");
            continue;
        }

        let email = normalize_email(email_raw);
        let user: Option<(i64, String)> =
            sqlx::query_as("SELECT id, role FROM users WHERE email = $1")
                .bind(&email)
                .fetch_optional(&state.db)
                .await?;
        let user_id = match user {
            None => {
                report.row_error(line, format!("no user with email '{}'", email));
                continue;
            },
            Some((_, ref role)) if role.parse::<Role>() != Ok(Role::Delegate) => {
                report.row_error(line, format!("user '{}' is not a delegate", email));
                continue;
            },
            Some((id, _)) => id,
        };

        let code = code_raw.to_uppercase();
        let committee_id = match committee_cache.get(&code) {
            Some(cached) => *cached,
            None => {
                let found: Option<i64> =
                    sqlx::query_scalar("SELECT id FROM committees WHERE upper(code) = $1")
                        .bind(&code)
                        .fetch_optional(&state.db)
                        .await?;
                committee_cache.insert(code.clone(), found);
                found
            },
        };
        let Some(committee_id) = committee_id else {
            report.row_error(line, format!("no committee with code '{}'", code));
            continue;
        };

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM delegates WHERE user_id = $1 AND committee_id = $2",
        )
        .bind(user_id)
        .bind(committee_id)
        .fetch_optional(&state.db)
        .await?;

        match existing {
            Some(id) => {
                let obs = state.auditor.begin(
                    UPDATE_DELEGATE,
                    Params::new().push("id", id).push("country", country),
                );
                sqlx::query(UPDATE_DELEGATE)
                    .bind(country)
                    .bind(veto_allowed)
                    .bind(id)
                    .execute(&state.db)
                    .await?;
                obs.finish(&state.db).await;
                report.updated += 1;
            },
            None => {
                let obs = state.auditor.begin(
                    INSERT_DELEGATE,
                    Params::new()
                        .push("user_id", user_id)
                        .push("committee_id", committee_id)
                        .push("country", country),
                );
                sqlx::query(INSERT_DELEGATE)
                    .bind(user_id)
                    .bind(committee_id)
                    .bind(country)
                    .bind(veto_allowed)
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
        "Delegate import completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_columns() {
        let headers = csv::StringRecord::from(vec!["userEmail", "country"]);
        let missing = column_indices(&headers, &REQUIRED_COLUMNS).unwrap_err();
        assert_eq!(missing, vec!["committeeCode"]);

        let headers =
            csv::StringRecord::from(vec!["userEmail", "committeeCode", "country", "vetoAllowed"]);
        assert!(column_indices(&headers, &REQUIRED_COLUMNS).is_ok());
    }
}
