//! Gachadex server library.
//!
//! Everything behind the `gachadex-server` binary: configuration, storage,
//! services, middleware, and routes. Exposed as a library so the CLI and the
//! integration tests can drive the same code.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
