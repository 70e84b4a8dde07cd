//! User commands

pub mod create;
pub mod import;
pub mod set_permissions;
pub mod update;

pub use create::{CreateUserCommand, CreateUserError};
pub use import::ImportUsersError;
pub use set_permissions::{SetPermissionsCommand, SetPermissionsError};
pub use update::{UpdateUserCommand, UpdateUserError};
