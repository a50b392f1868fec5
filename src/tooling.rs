//! Tooling Layer
//!
//! Command-line access to the node store.

pub mod cli;

pub use cli::{Cli, CliContext, Commands, DeviceCommands, NodeCommands};
