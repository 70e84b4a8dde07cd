//! Shared building blocks for the MUN back-office services.

pub mod error;
pub mod logging;

pub use error::{MunError, Result};
