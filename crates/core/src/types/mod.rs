//! Core types for Gachadex.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod catalog;
pub mod code;
pub mod credits;
pub mod email;
pub mod id;
pub mod rarity;
pub mod username;

pub use catalog::{Catalog, CatalogError, CatalogItem};
pub use code::{CODE_TTL_SECONDS, CodeError, OneTimeCode};
pub use credits::{Credits, InsufficientCredits};
pub use email::{Email, EmailError};
pub use id::*;
pub use rarity::{ParseRarityError, Rarity};
pub use username::{Username, UsernameError};
