//! Log commands

pub mod purge;
