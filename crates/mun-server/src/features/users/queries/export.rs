//! Export all users as CSV
//!
//! Column order mirrors the import format so an export can be re-imported
//! unchanged.

use chrono::Utc;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::UserRow;

pub const EXPORT_COLUMNS: [&str; 5] = ["name", "email", "role", "organization", "phone"];

/// Timestamped attachment name, e.g. `users_20260823_143000.csv`
pub fn export_filename() -> String {
    format!("users_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"))
}

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool) -> Result<String, AppError> {
    let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY id")
        .fetch_all(&pool)
        .await?;

    render(&rows).map_err(|e| AppError::Internal(format!("CSV rendering failed: {}", e)))
}

fn render(rows: &[UserRow]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for row in rows {
        writer.write_record([
            row.name.as_str(),
            row.email.as_str(),
            row.role.as_str(),
            row.organization.as_deref().unwrap_or(""),
            row.phone.as_deref().unwrap_or(""),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_render_matches_import_columns() {
        let rows = vec![UserRow {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.org".to_string(),
            password_hash: "hash".to_string(),
            role: "delegate".to_string(),
            organization: Some("UN".to_string()),
            phone: None,
            last_login: None,
            session_token: None,
            permissions: "[]".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }];

        let csv_text = render(&rows).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(lines.next(), Some("name,email,role,organization,phone"));
        assert_eq!(lines.next(), Some("Ana,ana@example.org,delegate,UN,"));
    }

    #[test]
    fn test_filename_shape() {
        let name = export_filename();
        assert!(name.starts_with("users_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "users_20260823_143000.csv".len());
    }
}
