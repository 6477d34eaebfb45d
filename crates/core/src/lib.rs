//! Gachadex Core - shared types and the draw engine.
//!
//! This crate provides the domain types and pure algorithms used by every
//! Gachadex component:
//! - `server` - JSON API for accounts, two-factor login, draws, and collections
//! - `cli` - Command-line tools for migrations and maintenance
//!
//! # Architecture
//!
//! The core crate contains only types and algorithms - no I/O, no database
//! access, no HTTP clients. Randomness is always passed in by the caller so
//! draws are reproducible under a seeded RNG.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, usernames, credits, rarities,
//!   catalog items, and one-time codes
//! - [`draw`] - Rarity-weighted draw with the independent shiny roll
//! - [`collection`] - Owned entries and the upgrade-only merge rule

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod collection;
pub mod draw;
pub mod types;

pub use collection::{Collection, MergeOutcome, OwnedEntry};
pub use draw::{DrawError, DrawResult, SHINY_PROBABILITY, draw, roll_shiny, select_rarity};
pub use types::*;
