//! Committee queries

pub mod get;
pub mod list;
