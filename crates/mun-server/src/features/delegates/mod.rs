//! Delegate assignment feature (presidium)
//!
//! A delegate assignment links a delegate-role user to a committee with a
//! country seat. One user holds at most one seat per committee.

pub mod commands;
pub mod queries;
pub mod routes;

pub use routes::delegates_routes;

/// Joined select used by every delegate read path
pub(crate) const SELECT_JOINED: &str = "SELECT d.id, d.user_id, d.committee_id, d.country, \
     d.veto_allowed, d.created_at, d.updated_at, \
     u.name AS user_name, u.email AS user_email, \
     c.code AS committee_code, c.name AS committee_name \
     FROM delegates d \
     JOIN users u ON u.id = d.user_id \
     JOIN committees c ON c.id = d.committee_id";
