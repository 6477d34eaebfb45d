//! Domain models for the Gachadex server.
//!
//! These are validated domain objects, separate from database row types.

pub mod collection;
pub mod session;
pub mod user;

pub use collection::{CollectedItem, CollectionEntry};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{NewUser, Profile, User, UserCredentials};
