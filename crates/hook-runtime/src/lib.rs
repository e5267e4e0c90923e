//! # Hook Runtime Library
//!
//! Startup helpers for the `hook-runtime` binary, exposed for testing.

#![allow(missing_docs)]

pub mod config;
pub mod shutdown;

pub use config::{load_config, load_config_from};
pub use shutdown::shutdown_signal;
