//! Delegate commands

pub mod delete;
pub mod import;
pub mod upsert;

pub use delete::DeleteDelegateError;
pub use import::ImportDelegatesError;
pub use upsert::{UpsertDelegateCommand, UpsertDelegateError};
