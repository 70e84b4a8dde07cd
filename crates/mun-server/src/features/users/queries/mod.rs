//! User queries

pub mod export;
pub mod get;
pub mod list;
pub mod permissions;

pub use get::GetUserError;
pub use list::{ListUsersQuery, ListUsersResponse};
