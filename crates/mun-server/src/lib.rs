//! MUN Back-Office Server Library
//!
//! HTTP server for Model United Nations conference administration.
//!
//! # Overview
//!
//! The server provides a REST API over PostgreSQL for conference back-office
//! operations:
//!
//! - **Accounts**: users with roles (admin / dais / delegate / observer) and
//!   per-user permission overrides
//! - **Venues**: committees with status, dais assignments, time configuration
//!   and agenda sessions
//! - **Delegates**: country assignments linking delegate users to committees,
//!   with CSV bulk import/export
//! - **Audit trail**: every observed SQL statement is recorded to a rotating
//!   JSON-lines file and optionally mirrored into an audit table
//!
//! # Architecture
//!
//! Feature slices follow a CQRS layout: each entity owns its `commands/`
//! (write operations), `queries/` (read operations) and `routes.rs`. Write
//! statements are observed by the [`audit`] layer, which attributes them to
//! the acting user via the request's session token. Audit failures are never
//! surfaced to the caller.
//!
//! ## Framework stack
//!
//! - **Axum** for routing and extraction
//! - **SQLx** for PostgreSQL access
//! - **Tower / tower-http** for CORS, tracing and the audit request scope

pub mod api;
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod features;
pub mod middleware;
pub mod models;

pub use error::{AppError, AppResult};
