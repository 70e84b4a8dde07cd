//! Committee commands

pub mod add_session;
pub mod create;
pub mod delete;
pub mod update;

pub use add_session::{AddSessionCommand, AddSessionError};
pub use create::{CreateCommitteeCommand, CreateCommitteeError};
pub use delete::DeleteCommitteeError;
pub use update::{UpdateCommitteeCommand, UpdateCommitteeError};
