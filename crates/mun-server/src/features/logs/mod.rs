//! Audit trail feature (admin)
//!
//! Read-only listing over the `logs` table plus a purge command. The purge
//! itself is suppressed so it cannot recursively audit the table it empties;
//! a single manual record with the deleted count is written afterwards.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::logs_routes;

/// Joined select used by the log read path
pub(crate) const SELECT_JOINED: &str = "SELECT l.id, l.actor_user_id, l.action, l.target_table, \
     l.target_id, l.meta_json, l.timestamp, \
     u.name AS actor_name, u.email AS actor_email, u.role AS actor_role \
     FROM logs l \
     LEFT JOIN users u ON u.id = l.actor_user_id";
