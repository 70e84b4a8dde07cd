//! SQL statement sniffing
//!
//! Best-effort inference of the action, target table, and target row id from
//! raw SQL text and bound parameters. The heuristics never fail; anything
//! unrecognized degrades to UNKNOWN / None.

use std::sync::OnceLock;

use regex::Regex;

use super::params::Params;

/// Conservative identifier pattern applied after quote stripping
fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

fn from_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bFROM\s+([A-Za-z0-9_."`]+)"#).unwrap())
}

fn into_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\bINTO\s+([A-Za-z0-9_."`]+)"#).unwrap())
}

fn update_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)^\s*UPDATE\s+([A-Za-z0-9_."`]+)"#).unwrap())
}

/// Infer the action from the first keyword of the statement
pub fn infer_action(sql: &str) -> &'static str {
    match sql
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase()
        .as_str()
    {
        "SELECT" => "SELECT",
        "INSERT" => "INSERT",
        "UPDATE" => "UPDATE",
        "DELETE" => "DELETE",
        _ => "UNKNOWN",
    }
}

/// Infer the target table from the statement text.
///
/// SELECT and DELETE look after FROM, INSERT after INTO, UPDATE takes the
/// token following the keyword. Quoting is stripped; schema qualifiers are
/// dropped; anything that does not look like a plain identifier is discarded.
pub fn infer_table(sql: &str) -> Option<String> {
    let raw = match infer_action(sql) {
        "SELECT" | "DELETE" => from_re().captures(sql)?.get(1)?.as_str(),
        "INSERT" => into_re().captures(sql)?.get(1)?.as_str(),
        "UPDATE" => update_re().captures(sql)?.get(1)?.as_str(),
        _ => return None,
    };

    let unquoted: String = raw.chars().filter(|c| *c != '"' && *c != '`').collect();
    let name = unquoted.rsplit('.').next()?.to_string();

    if identifier_re().is_match(&name) {
        Some(name)
    } else {
        None
    }
}

/// Best-effort target row id from the bound parameters.
///
/// Checks `id`, `user_id`, and `target_id` in order. A list value (batched
/// statement) is unwrapped one level via its first element.
pub fn extract_target_id(params: &Params) -> Option<i64> {
    for name in ["id", "user_id", "target_id"] {
        if let Some(value) = params.get(name) {
            if let Some(id) = value.as_i64() {
                return Some(id);
            }
            if let super::params::ParamValue::List(items) = value {
                if let Some(id) = items.first().and_then(|v| v.as_i64()) {
                    return Some(id);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::params::ParamValue;

    #[test]
    fn test_infer_action_first_keyword() {
        assert_eq!(infer_action("SELECT * FROM users"), "SELECT");
        assert_eq!(infer_action("  insert into logs values ($1)"), "INSERT");
        assert_eq!(infer_action("UPDATE users SET name = $1"), "UPDATE");
        assert_eq!(infer_action("DELETE FROM delegates WHERE id = $1"), "DELETE");
        assert_eq!(infer_action("TRUNCATE logs"), "UNKNOWN");
        assert_eq!(infer_action(""), "UNKNOWN");
    }

    #[test]
    fn test_infer_table_per_action() {
        assert_eq!(
            infer_table("SELECT id FROM users WHERE email = $1"),
            Some("users".to_string())
        );
        assert_eq!(
            infer_table("INSERT INTO delegates (user_id) VALUES ($1)"),
            Some("delegates".to_string())
        );
        assert_eq!(
            infer_table("UPDATE committees SET name = $1 WHERE id = $2"),
            Some("committees".to_string())
        );
        assert_eq!(
            infer_table("DELETE FROM committee_sessions WHERE id = $1"),
            Some("committee_sessions".to_string())
        );
    }

    #[test]
    fn test_infer_table_strips_quotes_and_schema() {
        assert_eq!(
            infer_table(r#"SELECT * FROM "users""#),
            Some("users".to_string())
        );
        assert_eq!(
            infer_table("SELECT * FROM public.users"),
            Some("users".to_string())
        );
        assert_eq!(infer_table("SELECT 1"), None);
    }

    #[test]
    fn test_suspicious_identifier_discarded() {
        assert_eq!(infer_table("SELECT * FROM 1users"), None);
    }

    #[test]
    fn test_target_id_priority_and_batch() {
        let params = Params::new().push("user_id", 5i64).push("id", 3i64);
        assert_eq!(extract_target_id(&params), Some(3));

        let params = Params::new().push("email", "a@b.c");
        assert_eq!(extract_target_id(&params), None);

        let batched = Params::new().push(
            "id",
            ParamValue::List(vec![ParamValue::Int(11), ParamValue::Int(12)]),
        );
        assert_eq!(extract_target_id(&batched), Some(11));
    }
}
