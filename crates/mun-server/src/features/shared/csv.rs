//! CSV helpers for bulk import/export
//!
//! Uploaded files are decoded as UTF-8 (after stripping a BOM) with a GBK
//! fallback, since sheets exported from Chinese-locale spreadsheet tools
//! arrive GBK-encoded. Exports are UTF-8 with a BOM so the same tools open
//! them correctly.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Decode uploaded CSV bytes to text
pub fn decode_upload(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::GBK.decode(bytes);
            decoded.into_owned()
        },
    }
}

/// Map required header columns to their indices, reporting any that are
/// missing. Header names are matched after trimming, case-sensitively.
pub fn column_indices(
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<HashMap<String, usize>, Vec<String>> {
    let mut indices = HashMap::new();
    for (index, name) in headers.iter().enumerate() {
        indices.insert(name.trim().to_string(), index);
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|name| !indices.contains_key(**name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(indices)
    } else {
        Err(missing)
    }
}

/// Field accessor for one parsed row, tolerant of short records
pub fn field<'a>(
    record: &'a csv::StringRecord,
    indices: &HashMap<String, usize>,
    name: &str,
) -> &'a str {
    indices
        .get(name)
        .and_then(|index| record.get(*index))
        .map(|value| value.trim())
        .unwrap_or("")
}

/// Build a `text/csv` attachment response with a UTF-8 BOM
pub fn attachment(filename: &str, body: String) -> Response {
    let mut bytes = Vec::with_capacity(body.len() + UTF8_BOM.len());
    bytes.extend_from_slice(UTF8_BOM);
    bytes.extend_from_slice(body.as_bytes());

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Outcome of a bulk import
#[derive(Debug, Default, serde::Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Record one failed row. `line` is 1-based and counts the header line.
    pub fn row_error(&mut self, line: usize, reason: impl std::fmt::Display) {
        self.errors.push(format!("Row {}: {}", line, reason));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(b"name,email\n");
        assert_eq!(decode_upload(&bytes), "name,email\n");
    }

    #[test]
    fn test_decode_gbk_fallback() {
        // "中国" in GBK
        let gbk = [0xD6u8, 0xD0, 0xB9, 0xFA];
        assert_eq!(decode_upload(&gbk), "中国");
    }

    #[test]
    fn test_decode_plain_utf8() {
        assert_eq!(decode_upload("país".as_bytes()), "país");
    }

    #[test]
    fn test_column_indices_reports_missing() {
        let headers = csv::StringRecord::from(vec!["name", "email"]);
        let result = column_indices(&headers, &["name", "email", "role", "phone"]);
        assert_eq!(result.unwrap_err(), vec!["role", "phone"]);

        let headers = csv::StringRecord::from(vec![" name ", "email", "role"]);
        let indices = column_indices(&headers, &["name", "role"]).unwrap();
        assert_eq!(indices["name"], 0);
        assert_eq!(indices["role"], 2);
    }

    #[test]
    fn test_field_tolerates_short_records() {
        let headers = csv::StringRecord::from(vec!["name", "email", "phone"]);
        let indices = column_indices(&headers, &["name"]).unwrap();
        let record = csv::StringRecord::from(vec!["Ana"]);
        assert_eq!(field(&record, &indices, "name"), "Ana");
        assert_eq!(field(&record, &indices, "phone"), "");
        assert_eq!(field(&record, &indices, "missing"), "");
    }

    #[test]
    fn test_import_report_lines() {
        let mut report = ImportReport::default();
        report.row_error(3, "email is required");
        assert_eq!(report.errors, vec!["Row 3: email is required"]);
    }
}
