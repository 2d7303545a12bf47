//! Configuration loader with XDG-compliant path resolution
//!
//! Loads configuration from multiple locations with layered priority:
//! 1. `/etc/magefilehub/config.toml` (lowest priority)
//! 2. `~/.config/magefilehub/config.toml`
//! 3. `~/.magefilehub.toml`
//! 4. `<project>/.magefilehub.toml` (highest priority)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::model::Config;

/// Application name used for XDG directories
const APP_NAME: &str = "magefilehub";

/// Prefix for environment overrides
const ENV_PREFIX: &str = "MAGEFILEHUB_";

/// Get XDG config search paths in priority order (lowest to highest)
///
/// The last entry is the project-local file under `project_root`.
pub fn config_paths(project_root: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("/etc/{}/config.toml", APP_NAME)));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("config.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}.toml", APP_NAME)));
    }

    paths.push(project_root.join(format!(".{}.toml", APP_NAME)));

    paths
}

/// Load configuration with XDG layering
///
/// Configurations are merged in priority order, with later files
/// overriding earlier ones. Environment variables with prefix
/// `MAGEFILEHUB_` override all file-based configuration.
///
/// # Arguments
/// * `project_root` - Directory searched for the project-local config file
/// * `override_path` - Optional path to a config file that takes highest file priority
pub fn load_config(project_root: &Path, override_path: Option<&Path>) -> Result<Config> {
    let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

    for path in config_paths(project_root) {
        if path.exists() {
            tracing::debug!("Loading config from: {}", path.display());
            figment = figment.merge(Toml::file(&path));
        }
    }

    if let Some(path) = override_path {
        if path.exists() {
            tracing::debug!("Loading override config from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        } else {
            tracing::warn!("Override config not found: {}", path.display());
        }
    }

    // MAGEFILEHUB_DELEGATE__TIMEOUT=60 maps to delegate.timeout = 60.
    // Single-underscore names like MAGEFILEHUB_VERBOSE belong to the CLI and
    // don't match any key.
    figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

    figment.extract().context("Failed to load configuration")
}

/// Find all existing config files (for debugging/introspection)
pub fn find_config_files(project_root: &Path) -> Vec<PathBuf> {
    config_paths(project_root).into_iter().filter(|p| p.exists()).collect()
}
