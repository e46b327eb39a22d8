//! `diskwatch-agent` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod config;
pub mod probes;
pub mod runner;
pub mod subprocess;
