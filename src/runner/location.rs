//! Magefile location detection
//!
//! A project keeps its build targets either in a `magefiles/` directory or in a
//! single `magefile.go` at the project root. The directory wins when both are
//! present; that situation is reported as a conflict because mage refuses to
//! run with both in place.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::DiscoveryConfig;

/// Directory convention for multi-file magefiles
pub const MAGEFILES_DIR: &str = "magefiles";

/// Single-file convention
pub const MAGEFILE_NAME: &str = "magefile.go";

/// Where the build targets live
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScriptLocation {
    /// No magefile in the project
    None,
    /// `magefiles/` directory, with the root `magefile.go` if it also exists
    Directory {
        path: PathBuf,
        #[serde(skip_serializing_if = "Option::is_none")]
        conflicting_file: Option<PathBuf>,
    },
    /// Root `magefile.go`
    SingleFile(PathBuf),
}

impl ScriptLocation {
    /// Path of the primary location
    pub fn path(&self) -> Option<&Path> {
        match self {
            ScriptLocation::None => None,
            ScriptLocation::Directory { path, .. } => Some(path),
            ScriptLocation::SingleFile(path) => Some(path),
        }
    }

    /// Whether both conventions are present at once
    pub fn has_conflict(&self) -> bool {
        matches!(
            self,
            ScriptLocation::Directory {
                conflicting_file: Some(_),
                ..
            }
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ScriptLocation::None)
    }
}

impl fmt::Display for ScriptLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptLocation::None => write!(f, "none"),
            ScriptLocation::Directory { path, .. } => write!(f, "directory:{}", path.display()),
            ScriptLocation::SingleFile(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Resolves the magefile location under a project root
///
/// Nothing is cached: every call looks at the filesystem again, since a
/// long-running process may see magefiles appear or disappear.
#[derive(Debug, Clone)]
pub struct ScriptLocator {
    root: PathBuf,
    directory_name: String,
    file_name: String,
}

impl ScriptLocator {
    /// Locator using the standard `magefiles/` and `magefile.go` names
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            directory_name: MAGEFILES_DIR.to_string(),
            file_name: MAGEFILE_NAME.to_string(),
        }
    }

    /// Locator rooted at the current working directory
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    /// Locator with the names from configuration
    pub fn from_config(root: impl Into<PathBuf>, config: &DiscoveryConfig) -> Self {
        Self {
            root: root.into(),
            directory_name: config.directory.clone(),
            file_name: config.file.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Determine which convention is present
    pub fn resolve(&self) -> ScriptLocation {
        let dir = self.root.join(&self.directory_name);
        let file = self.root.join(&self.file_name);
        let has_file = file.is_file();

        if dir.is_dir() {
            return ScriptLocation::Directory {
                path: dir,
                conflicting_file: has_file.then_some(file),
            };
        }

        if has_file {
            return ScriptLocation::SingleFile(file);
        }

        ScriptLocation::None
    }

    /// Whether any magefile exists
    pub fn has_script(&self) -> bool {
        !self.resolve().is_none()
    }

    /// Absolute path of the primary location, for display
    ///
    /// Falls back to the unresolved path if it cannot be made absolute.
    pub fn display_path(&self) -> Option<PathBuf> {
        let location = self.resolve();
        let path = location.path()?;
        Some(std::path::absolute(path).unwrap_or_else(|e| {
            tracing::debug!("Could not make {} absolute: {}", path.display(), e);
            path.to_path_buf()
        }))
    }
}
