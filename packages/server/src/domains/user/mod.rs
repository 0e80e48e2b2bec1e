//! B2B user domain - organization memberships and impersonation

pub mod actions;
pub mod data;
pub mod models;

pub use data::{AddUserInput, B2BUserData, ImpersonationData, RemoveUserInput};
pub use models::B2BUser;
