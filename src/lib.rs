//! magefilehub - mage target discovery and delegation
//!
//! Finds build targets in a project's `magefiles/` directory or `magefile.go`
//! and runs them without plugin compilation:
//! - **Discovery** - Go sources are parsed with tree-sitter, never compiled
//! - **Normalization** - `namespace:Method` is flattened to mage's target names
//! - **Delegation** - `mage` when installed, `go run -tags=mage` otherwise
//!
//! ## Features
//!
//! - Case-insensitive lookup of targets and namespaced methods
//! - Explicit discovery cache with invalidation
//! - Deadline enforcement with exit code 124 on timeout
//! - Live stderr with noise filtering and full capture for error reports
//! - XDG-compliant layered configuration

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod runner;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{DelegateError, DiscoveryError, ErrorInfo};
pub use executor::{DelegateResult, Delegator, RunnerType, TIMEOUT_EXIT_CODE};
pub use runner::{
    normalize, CommandDiscovery, CommandLookup, DiscoveredCommand, ScriptLocation, ScriptLocator,
};
