//! Authentication and authorization
//!
//! Session tokens are opaque 64-hex strings stored on the user row (one
//! active session per user). A request may present its token three ways, in
//! priority order: `Authorization: Bearer` header, the session cookie, or a
//! `token` field in a JSON body.

pub mod permissions;

use argon2::{
    password_hash::{rand_core::OsRng as HashOsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::{header, HeaderMap};
use rand::RngCore;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{Role, UserRow};

/// Password assigned to new and imported accounts until the user changes it
pub const DEFAULT_PASSWORD: &str = "123456";

/// Minimum length for user-chosen passwords
pub const MIN_PASSWORD_LEN: usize = 12;

/// Extract a session token from the request, in priority order: Bearer
/// header, session cookie, then a `token` string field of an already-parsed
/// JSON body.
pub fn extract_token(
    headers: &HeaderMap,
    cookie_name: &str,
    body: Option<&serde_json::Value>,
) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Ok(text) = value.to_str() {
            if let Some(token) = text.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    if let Some(token) = cookie_value(headers, cookie_name) {
        return Some(token);
    }

    if let Some(body) = body {
        if let Some(token) = body.get("token").and_then(|v| v.as_str()) {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    None
}

/// Read one cookie value from the Cookie header
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        if let Some((key, value)) = pair.trim().split_once('=') {
            if key == name && !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Resolve a session token to its user
#[tracing::instrument(skip(pool, token))]
pub async fn authenticate(pool: &PgPool, token: Option<&str>) -> AppResult<UserRow> {
    let token =
        token.ok_or_else(|| AppError::Unauthorized("Authentication token is required".into()))?;

    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE session_token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    user.ok_or_else(|| AppError::Unauthorized("Invalid or expired session token".into()))
}

/// Admin-only gate
pub fn require_admin(user: &UserRow) -> AppResult<()> {
    if user.role_parsed() == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Administrator access required".into()))
    }
}

/// Presidium gate: admin, dais, or an explicit `presidium:manage` grant
pub fn require_presidium(user: &UserRow) -> AppResult<()> {
    let role = user.role_parsed();
    if role == Role::Admin
        || role == Role::Dais
        || permissions::has_permission(user, "presidium:manage")
    {
        Ok(())
    } else {
        Err(AppError::Forbidden("Presidium access required".into()))
    }
}

/// Generate a fresh 64-hex session token
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with argon2 and a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut HashOsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored argon2 hash. Unparseable hashes fail
/// closed.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Build the Set-Cookie value that installs the session cookie
pub fn session_cookie(name: &str, token: &str, hours: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        token,
        hours * 3600
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the Set-Cookie value that clears the session cookie
pub fn clear_session_cookie(name: &str, secure: bool) -> String {
    let mut cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Utc;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (key, value) in pairs {
            map.insert(
                header::HeaderName::from_bytes(key.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let map = headers(&[
            ("authorization", "Bearer abc123"),
            ("cookie", "mun_session=cookie456"),
        ]);
        assert_eq!(
            extract_token(&map, "mun_session", None),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_cookie_wins_over_body() {
        let map = headers(&[("cookie", "other=1; mun_session=cookie456")]);
        let body = serde_json::json!({"token": "body789"});
        assert_eq!(
            extract_token(&map, "mun_session", Some(&body)),
            Some("cookie456".to_string())
        );
    }

    #[test]
    fn test_body_token_is_last_resort() {
        let map = HeaderMap::new();
        let body = serde_json::json!({"token": "body789"});
        assert_eq!(
            extract_token(&map, "mun_session", Some(&body)),
            Some("body789".to_string())
        );
        assert_eq!(extract_token(&map, "mun_session", None), None);
    }

    #[test]
    fn test_empty_bearer_falls_through() {
        let map = headers(&[
            ("authorization", "Bearer "),
            ("cookie", "mun_session=cookie456"),
        ]);
        assert_eq!(
            extract_token(&map, "mun_session", None),
            Some("cookie456".to_string())
        );
    }

    #[test]
    fn test_token_is_64_hex() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_gates() {
        let mut user = UserRow {
            id: 1,
            name: "Test".to_string(),
            email: "t@example.org".to_string(),
            password_hash: String::new(),
            role: "observer".to_string(),
            organization: None,
            phone: None,
            last_login: None,
            session_token: None,
            permissions: "[]".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(require_admin(&user).is_err());
        assert!(require_presidium(&user).is_err());

        user.role = "dais".to_string();
        assert!(require_admin(&user).is_err());
        assert!(require_presidium(&user).is_ok());

        user.role = "observer".to_string();
        user.permissions = r#"["presidium:manage"]"#.to_string();
        assert!(require_presidium(&user).is_ok());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("mun_session", "tok", 8, false);
        assert!(cookie.contains("mun_session=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=28800"));
        assert!(!cookie.contains("Secure"));

        let cleared = clear_session_cookie("mun_session", true);
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.contains("Secure"));
    }
}
