//! Configuration model for magefilehub
//!
//! Defines the structure for XDG-compliant layered configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Where build targets are looked up
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// How targets are handed off to mage or the Go toolchain
    #[serde(default)]
    pub delegate: DelegateConfig,
}

/// Magefile location conventions
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Directory holding multiple magefile sources
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Single magefile at the project root
    #[serde(default = "default_file")]
    pub file: String,
}

fn default_directory() -> String {
    "magefiles".to_string()
}

fn default_file() -> String {
    "magefile.go".to_string()
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            file: default_file(),
        }
    }
}

/// Delegation settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DelegateConfig {
    /// External runner binary looked up on PATH
    #[serde(default = "default_runner")]
    pub runner: String,

    /// Go toolchain used when the runner is missing
    #[serde(default = "default_toolchain")]
    pub toolchain: String,

    /// Build tag passed to `go run`
    #[serde(default = "default_build_tag")]
    pub build_tag: String,

    /// Environment variable carrying the space-joined target arguments
    #[serde(default = "default_args_env")]
    pub args_env: String,

    /// Stderr lines containing this text are not echoed live
    #[serde(default = "default_noise_marker")]
    pub noise_marker: String,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_runner() -> String {
    "mage".to_string()
}

fn default_toolchain() -> String {
    "go".to_string()
}

fn default_build_tag() -> String {
    "mage".to_string()
}

fn default_args_env() -> String {
    "MAGE_ARGS".to_string()
}

fn default_noise_marker() -> String {
    "Unknown target specified:".to_string()
}

fn default_timeout() -> u64 {
    600
}

impl Default for DelegateConfig {
    fn default() -> Self {
        Self {
            runner: default_runner(),
            toolchain: default_toolchain(),
            build_tag: default_build_tag(),
            args_env: default_args_env(),
            noise_marker: default_noise_marker(),
            timeout: default_timeout(),
        }
    }
}

impl DelegateConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
