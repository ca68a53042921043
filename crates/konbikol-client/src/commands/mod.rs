//! Subcommand implementations.

pub mod config;
pub mod event;
pub mod parse;
pub mod server;
