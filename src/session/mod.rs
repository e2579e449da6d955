//! Session Module
//!
//! Server-side session records and the two interchangeable stores that own them.
//!
//! Lifecycle per session id: `absent -> active -> (expired | destroyed)`.
//! Expiry is evaluated lazily on every `resolve`; `purge_expired` is only a
//! memory optimisation.

pub mod durable;
pub mod persistence;
pub mod types;
pub mod volatile;

pub use durable::DurableSessionStore;
pub use persistence::{JsonFilePersistence, MemoryPersistence, SessionPersistence, SessionQuery};
pub use types::{Session, SessionStore};
pub use volatile::VolatileSessionStore;
