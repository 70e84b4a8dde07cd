//! Log queries

pub mod list;

pub use list::{ListLogsQuery, ListLogsResponse};
