//! CLI module for magefilehub
//!
//! Provides command-line interface with the following subcommands:
//! - `run` - Run a target through mage or go run
//! - `list` - List discovered targets
//! - `search` - Search targets
//! - `locate` - Show the magefile location
//! - `config` - Show configuration
//! - `init` - Create a starter magefile.go

pub mod commands;
pub mod scaffold;

pub use commands::{Cli, Commands};
pub use scaffold::write_starter;
