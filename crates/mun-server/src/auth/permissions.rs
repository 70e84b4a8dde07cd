//! Role permission table and effective-permission resolution

use crate::models::{Role, UserRow};

/// Permissions granted by each role
pub fn role_permissions(role: Role) -> &'static [&'static str] {
    match role {
        Role::Admin => &[
            "users:manage",
            "presidium:manage",
            "delegates:manage",
            "logs:read",
        ],
        Role::Dais => &[
            "presidium:manage",
            "timeline:update",
            "crisis:dispatch",
            "messages:broadcast",
        ],
        Role::Delegate => &["delegate:self", "documents:submit", "messages:send"],
        Role::Observer => &["observer:read", "reports:view"],
    }
}

/// Default permission grant for a freshly created user of the given role.
///
/// Admin and dais accounts start with the union of every role's permissions;
/// delegates get their own role set; observers get the read grant only.
pub fn default_permissions(role: Role) -> Vec<String> {
    match role {
        Role::Admin | Role::Dais => {
            let mut all: Vec<String> = Role::ALL
                .iter()
                .flat_map(|r| role_permissions(*r).iter().map(|p| p.to_string()))
                .collect();
            all.sort();
            all.dedup();
            all
        },
        Role::Delegate => role_permissions(Role::Delegate)
            .iter()
            .map(|p| p.to_string())
            .collect(),
        Role::Observer => vec!["observer:read".to_string()],
    }
}

/// Effective permissions for a user: a non-empty stored override replaces the
/// role defaults entirely.
pub fn effective_permissions(user: &UserRow) -> Vec<String> {
    user.permission_override()
        .unwrap_or_else(|| default_permissions(user.role_parsed()))
}

pub fn has_permission(user: &UserRow, permission: &str) -> bool {
    effective_permissions(user).iter().any(|p| p == permission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(role: &str, permissions: &str) -> UserRow {
        UserRow {
            id: 1,
            name: "Test".to_string(),
            email: "test@example.org".to_string(),
            password_hash: String::new(),
            role: role.to_string(),
            organization: None,
            phone: None,
            last_login: None,
            session_token: None,
            permissions: permissions.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_defaults_are_union_of_all_roles() {
        let defaults = default_permissions(Role::Admin);
        assert!(defaults.contains(&"users:manage".to_string()));
        assert!(defaults.contains(&"crisis:dispatch".to_string()));
        assert!(defaults.contains(&"documents:submit".to_string()));
        assert!(defaults.contains(&"observer:read".to_string()));
        let mut deduped = defaults.clone();
        deduped.dedup();
        assert_eq!(defaults, deduped);
    }

    #[test]
    fn test_observer_default_is_read_only() {
        assert_eq!(default_permissions(Role::Observer), vec!["observer:read"]);
    }

    #[test]
    fn test_override_replaces_role_defaults() {
        let u = user("observer", r#"["presidium:manage"]"#);
        assert!(has_permission(&u, "presidium:manage"));
        assert!(!has_permission(&u, "observer:read"));
    }

    #[test]
    fn test_empty_override_falls_back_to_role() {
        let u = user("delegate", "[]");
        assert!(has_permission(&u, "documents:submit"));
        assert!(!has_permission(&u, "users:manage"));
    }
}
