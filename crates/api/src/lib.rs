//! VerseCraft API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! chat upstream client) so integration tests and the binary
//! entrypoint can both access them.

pub mod chat;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
