//! Database models
//!
//! Row types mirror the migration schema one to one. The `*View` types are
//! the camelCase JSON shapes the API returns; converting a row to its view is
//! the only place field names are translated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Dais,
    Delegate,
    Observer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Dais => "dais",
            Role::Delegate => "delegate",
            Role::Observer => "observer",
        }
    }

    pub const ALL: [Role; 4] = [Role::Admin, Role::Dais, Role::Delegate, Role::Observer];
}

impl std::str::FromStr for Role {
    type Err = String;

    /// Parse a role name. "chair" is a legacy alias for the dais role and
    /// normalizes to it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "dais" | "chair" => Ok(Role::Dais),
            "delegate" => Ok(Role::Delegate),
            "observer" => Ok(Role::Observer),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User row
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub session_token: Option<String>,
    /// Serialized JSON list of permission strings; "[]" means "use the role
    /// defaults".
    pub permissions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Parsed role, falling back to observer for values the enum no longer
    /// knows about.
    pub fn role_parsed(&self) -> Role {
        self.role.parse().unwrap_or(Role::Observer)
    }

    /// Stored permission override, if any. Empty or unparseable values mean
    /// no override.
    pub fn permission_override(&self) -> Option<Vec<String>> {
        let parsed: Vec<String> = serde_json::from_str(&self.permissions).ok()?;
        if parsed.is_empty() {
            None
        } else {
            Some(parsed)
        }
    }
}

/// User shape returned by the API (never includes the password hash or the
/// raw session token)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub organization: Option<String>,
    pub phone: Option<String>,
    pub permissions: Vec<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserRow> for UserView {
    fn from(row: &UserRow) -> Self {
        let permissions = row
            .permission_override()
            .unwrap_or_else(|| crate::auth::permissions::default_permissions(row.role_parsed()));
        Self {
            id: row.id,
            name: row.name.clone(),
            email: row.email.clone(),
            role: row.role.clone(),
            organization: row.organization.clone(),
            phone: row.phone.clone(),
            permissions,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Committee status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitteeStatus {
    Preparation,
    InSession,
    Paused,
    Closed,
}

impl CommitteeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitteeStatus::Preparation => "preparation",
            CommitteeStatus::InSession => "in_session",
            CommitteeStatus::Paused => "paused",
            CommitteeStatus::Closed => "closed",
        }
    }
}

impl std::str::FromStr for CommitteeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "preparation" => Ok(CommitteeStatus::Preparation),
            "in_session" => Ok(CommitteeStatus::InSession),
            "paused" => Ok(CommitteeStatus::Paused),
            "closed" => Ok(CommitteeStatus::Closed),
            other => Err(format!("Unknown committee status: {}", other)),
        }
    }
}

/// A dais seat on a committee: a user id plus the seat title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaisMember {
    pub id: i64,
    pub role: String,
}

/// Committee clock configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeConfig {
    pub real_time_anchor: Option<String>,
    #[serde(default = "default_flow_speed")]
    pub flow_speed: f64,
}

fn default_flow_speed() -> f64 {
    1.0
}

/// Committee row
#[derive(Debug, Clone, FromRow)]
pub struct CommitteeRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub capacity: i32,
    pub dais_json: Option<serde_json::Value>,
    pub time_config: Option<serde_json::Value>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Committee shape returned by the API, with its agenda sessions inlined
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeView {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub venue: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub capacity: i32,
    pub dais: Vec<DaisMember>,
    pub time_config: Option<TimeConfig>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sessions: Vec<CommitteeSessionView>,
}

impl CommitteeView {
    pub fn from_row(row: &CommitteeRow, sessions: Vec<CommitteeSessionView>) -> Self {
        let dais = row
            .dais_json
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();
        let time_config = row
            .time_config
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        Self {
            id: row.id,
            code: row.code.clone(),
            name: row.name.clone(),
            venue: row.venue.clone(),
            description: row.description.clone(),
            status: row.status.clone(),
            capacity: row.capacity,
            dais,
            time_config,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            sessions,
        }
    }
}

/// Agenda session row
#[derive(Debug, Clone, FromRow)]
pub struct CommitteeSessionRow {
    pub id: i64,
    pub committee_id: i64,
    pub topic: String,
    pub chair: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Agenda session shape returned by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeSessionView {
    pub id: i64,
    pub committee_id: i64,
    pub topic: String,
    pub chair: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&CommitteeSessionRow> for CommitteeSessionView {
    fn from(row: &CommitteeSessionRow) -> Self {
        Self {
            id: row.id,
            committee_id: row.committee_id,
            topic: row.topic.clone(),
            chair: row.chair.clone(),
            start_time: row.start_time,
            duration_minutes: row.duration_minutes,
            created_at: row.created_at,
        }
    }
}

/// Delegate assignment row
#[derive(Debug, Clone, FromRow)]
pub struct DelegateRow {
    pub id: i64,
    pub user_id: i64,
    pub committee_id: i64,
    pub country: String,
    pub veto_allowed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Delegate assignment joined with its user and committee summaries
#[derive(Debug, Clone, FromRow)]
pub struct DelegateJoinedRow {
    pub id: i64,
    pub user_id: i64,
    pub committee_id: i64,
    pub country: String,
    pub veto_allowed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub committee_code: String,
    pub committee_name: String,
}

/// Delegate shape returned by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateView {
    pub id: i64,
    pub user_id: i64,
    pub committee_id: i64,
    pub country: String,
    pub veto_allowed: bool,
    pub user_name: String,
    pub user_email: String,
    pub committee_code: String,
    pub committee_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DelegateJoinedRow> for DelegateView {
    fn from(row: &DelegateJoinedRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            committee_id: row.committee_id,
            country: row.country.clone(),
            veto_allowed: row.veto_allowed,
            user_name: row.user_name.clone(),
            user_email: row.user_email.clone(),
            committee_code: row.committee_code.clone(),
            committee_name: row.committee_name.clone(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Audit log row joined with its actor summary
#[derive(Debug, Clone, FromRow)]
pub struct LogJoinedRow {
    pub id: i64,
    pub actor_user_id: Option<i64>,
    pub action: String,
    pub target_table: Option<String>,
    pub target_id: Option<i64>,
    pub meta_json: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub actor_name: Option<String>,
    pub actor_email: Option<String>,
    pub actor_role: Option<String>,
}

/// Actor summary embedded in log responses
#[derive(Debug, Clone, Serialize)]
pub struct LogActor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// Audit log shape returned by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    pub id: i64,
    pub action: String,
    pub target_table: Option<String>,
    pub target_id: Option<i64>,
    pub meta: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub actor: Option<LogActor>,
}

impl From<&LogJoinedRow> for LogView {
    fn from(row: &LogJoinedRow) -> Self {
        let actor = row.actor_user_id.map(|id| LogActor {
            id,
            name: row.actor_name.clone().unwrap_or_default(),
            email: row.actor_email.clone().unwrap_or_default(),
            role: row.actor_role.clone().unwrap_or_default(),
        });
        Self {
            id: row.id,
            action: row.action.clone(),
            target_table: row.target_table.clone(),
            target_id: row.target_id,
            meta: row.meta_json.clone(),
            timestamp: row.timestamp,
            actor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_normalizes_chair() {
        assert_eq!("chair".parse::<Role>().unwrap(), Role::Dais);
        assert_eq!("CHAIR".parse::<Role>().unwrap(), Role::Dais);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("president".parse::<Role>().is_err());
    }

    #[test]
    fn test_committee_status_parse() {
        assert_eq!(
            "in_session".parse::<CommitteeStatus>().unwrap(),
            CommitteeStatus::InSession
        );
        assert!("archived".parse::<CommitteeStatus>().is_err());
    }

    #[test]
    fn test_permission_override_empty_means_none() {
        let mut row = sample_user();
        row.permissions = "[]".to_string();
        assert!(row.permission_override().is_none());

        row.permissions = "not json".to_string();
        assert!(row.permission_override().is_none());

        row.permissions = r#"["logs:read"]"#.to_string();
        assert_eq!(
            row.permission_override(),
            Some(vec!["logs:read".to_string()])
        );
    }

    #[test]
    fn test_time_config_flow_speed_defaults_to_one() {
        let config: TimeConfig =
            serde_json::from_str(r#"{"realTimeAnchor": "2026-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(config.flow_speed, 1.0);
    }

    #[test]
    fn test_user_view_hides_secrets() {
        let row = sample_user();
        let view = UserView::from(&row);
        let value = serde_json::to_value(&view).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("sessionToken").is_none());
        assert_eq!(value["email"], "ana@example.org");
    }

    fn sample_user() -> UserRow {
        UserRow {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@example.org".to_string(),
            password_hash: "hash".to_string(),
            role: "observer".to_string(),
            organization: None,
            phone: None,
            last_login: None,
            session_token: Some("deadbeef".to_string()),
            permissions: "[]".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
