//! Business logic services for the Gachadex server.
//!
//! # Services
//!
//! - `auth` - Registration, password login, and the second-factor step
//! - `two_factor` - One-time code issuance, verification, and cleanup
//! - `capture` - Draws, captures, pokéball grants, and collection queries
//! - `email` - Login code delivery (SMTP or log)
//!
//! Services borrow their collaborators and are cheap to build per request.

pub mod auth;
pub mod capture;
pub mod email;
pub mod two_factor;
