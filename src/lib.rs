//! Dashboard client for a remote stock price REST backend.
//!
//! Hexagonal architecture: pure view logic in [`domain`], port traits in
//! [`ports`], concrete HTTP, cache, config and rendering code in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
