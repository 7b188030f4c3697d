//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (path, show, init)
//! - [`simulate`] - Fly the built-in simulator through the detectors

pub mod config;
pub mod simulate;
