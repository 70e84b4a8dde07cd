//! Export all delegate assignments as CSV
//!
//! Column order matches the import format; vetoAllowed is rendered as 1/0.
//! Rows come out grouped by committee code, then country.

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::DelegateJoinedRow;

pub const EXPORT_COLUMNS: [&str; 6] = [
    "userEmail",
    "userName",
    "committeeCode",
    "committeeName",
    "country",
    "vetoAllowed",
];

pub const EXPORT_FILENAME: &str = "delegates.csv";

#[tracing::instrument(skip(pool))]
pub async fn handle(pool: PgPool) -> Result<String, AppError> {
    let sql = format!(
        "{} ORDER BY c.code ASC, d.country ASC",
        super::super::SELECT_JOINED
    );
    let rows: Vec<DelegateJoinedRow> = sqlx::query_as(&sql).fetch_all(&pool).await?;

    render(&rows).map_err(|e| AppError::Internal(format!("CSV rendering failed: {}", e)))
}

fn render(rows: &[DelegateJoinedRow]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for row in rows {
        writer.write_record([
            row.user_email.as_str(),
            row.user_name.as_str(),
            row.committee_code.as_str(),
            row.committee_name.as_str(),
            row.country.as_str(),
            if row.veto_allowed { "1" } else { "0" },
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(email: &str, code: &str, country: &str, veto: bool) -> DelegateJoinedRow {
        DelegateJoinedRow {
            id: 1,
            user_id: 7,
            committee_id: 3,
            country: country.to_string(),
            veto_allowed: veto,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_name: "Ana".to_string(),
            user_email: email.to_string(),
            committee_code: code.to_string(),
            committee_name: "Security Council".to_string(),
        }
    }

    #[test]
    fn test_render_veto_flag() {
        let rows = vec![row("ana@example.org", "SC", "France", true)];

        let csv_text = render(&rows).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next(),
            Some("userEmail,userName,committeeCode,committeeName,country,vetoAllowed")
        );
        assert_eq!(
            lines.next(),
            Some("ana@example.org,Ana,SC,Security Council,France,1")
        );
    }

    /// An exported file must read back through the import pipeline with the
    /// exact (email, code, country, veto) tuples it was rendered from, so
    /// re-importing it resolves to the same assignments and updates in place.
    #[test]
    fn test_export_reads_back_through_import_parsing() {
        use crate::features::delegates::commands::import::REQUIRED_COLUMNS;
        use crate::features::shared::csv::{column_indices, decode_upload, field};
        use crate::features::shared::validation::parse_truthy;

        let rows = vec![
            row("ana@example.org", "SC", "Korea, Republic of", true),
            row("li@example.org", "GA", "France", false),
        ];

        let csv_text = render(&rows).unwrap();
        let text = decode_upload(csv_text.as_bytes());
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers().unwrap().clone();
        let indices = column_indices(&headers, &REQUIRED_COLUMNS).unwrap();

        let parsed: Vec<csv::StringRecord> =
            reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(parsed.len(), rows.len());

        for (record, source) in parsed.iter().zip(&rows) {
            assert_eq!(field(record, &indices, "userEmail"), source.user_email);
            assert_eq!(field(record, &indices, "committeeCode"), source.committee_code);
            assert_eq!(field(record, &indices, "country"), source.country);
            assert_eq!(
                parse_truthy(field(record, &indices, "vetoAllowed")),
                source.veto_allowed
            );
        }
    }
}
