//! Fleet statistics CLI library.
//!
//! This crate provides the CLI interface for the fleet statistics engine.

mod cli;
pub mod commands;
mod config;
pub mod snapshot;

pub use cli::{Cli, Commands, PeriodArgs};
pub use config::Config;
