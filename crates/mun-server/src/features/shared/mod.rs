//! Shared utilities used across feature slices

pub mod csv;
pub mod pagination;
pub mod validation;
