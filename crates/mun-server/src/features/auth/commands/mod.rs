//! Authentication commands

pub mod change_password;
pub mod login;
pub mod logout;

pub use change_password::{ChangePasswordCommand, ChangePasswordError};
pub use login::{LoginCommand, LoginError, LoginResponse};
pub use logout::{LogoutCommand, LogoutResponse};
