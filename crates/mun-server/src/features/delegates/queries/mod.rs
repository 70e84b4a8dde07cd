//! Delegate queries

pub mod by_committee;
pub mod export;
pub mod list;

pub use list::{ListDelegatesQuery, ListDelegatesResponse};
