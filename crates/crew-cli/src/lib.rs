//! CLI argument models for the crew setup binary.
//!
//! Exposes the clap-backed flag set plus helpers that turn parsed flags into
//! the option structs consumed by the provider crate.

pub mod cli_args;
pub mod cli_types;

pub use cli_args::Cli;
pub use cli_types::*;
