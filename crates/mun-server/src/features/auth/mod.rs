//! Authentication feature: login, logout, profile, password change

pub mod commands;
pub mod routes;

pub use routes::auth_routes;
