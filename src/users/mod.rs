//! User Module
//!
//! The user-record collaborator consumed by authentication: credential lookup,
//! password verification and the session/reset-token fields on the record.

pub mod store;
pub mod types;

pub use store::{UserRepository, UserStore};
pub use types::{User, UserQuery, UserUpdate, UserView};
