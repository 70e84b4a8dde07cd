//! Shared validation utilities

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FieldValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),
    #[error("{0} is not a valid email address")]
    InvalidEmail(&'static str),
}

/// Require a non-blank string within a length bound
pub fn validate_required(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), FieldValidationError> {
    if value.trim().is_empty() {
        return Err(FieldValidationError::Required(field));
    }
    if value.len() > max_len {
        return Err(FieldValidationError::TooLong(field, max_len));
    }
    Ok(())
}

/// Minimal email shape check: non-blank, one '@' with text on both sides
pub fn validate_email(field: &'static str, value: &str) -> Result<(), FieldValidationError> {
    validate_required(field, value, 255)?;
    let trimmed = value.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(FieldValidationError::InvalidEmail(field)),
    }
}

/// Normalize an email for storage and comparison
pub fn normalize_email(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Parse CSV-style truthy values: 1, true, yes, y (case-insensitive)
pub fn parse_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required() {
        assert!(validate_required("name", "Ana", 255).is_ok());
        assert_eq!(
            validate_required("name", "  ", 255),
            Err(FieldValidationError::Required("name"))
        );
        assert_eq!(
            validate_required("code", "ABCDEF", 3),
            Err(FieldValidationError::TooLong("code", 3))
        );
    }

    #[test]
    fn test_email() {
        assert!(validate_email("email", "ana@example.org").is_ok());
        assert!(validate_email("email", "no-at-sign").is_err());
        assert!(validate_email("email", "@example.org").is_err());
        assert!(validate_email("email", "ana@nodot").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana@Example.ORG "), "ana@example.org");
    }

    #[test]
    fn test_truthy() {
        assert!(parse_truthy("1"));
        assert!(parse_truthy("TRUE"));
        assert!(parse_truthy(" yes "));
        assert!(!parse_truthy("0"));
        assert!(!parse_truthy(""));
        assert!(!parse_truthy("non"));
    }
}
