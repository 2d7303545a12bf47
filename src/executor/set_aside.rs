//! Temporary rename of a conflicting magefile
//!
//! mage refuses to run when `magefile.go` and `magefiles/` coexist, so the
//! single file is moved to `<name>.tmp` for the duration of a delegation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DelegateError;

/// Suffix appended to the set-aside file name
pub const SET_ASIDE_SUFFIX: &str = ".tmp";

/// Scoped rename; dropping the guard moves the file back
#[derive(Debug)]
#[must_use = "the file is restored as soon as the guard is dropped"]
pub struct SetAside {
    original: PathBuf,
    temporary: PathBuf,
}

impl SetAside {
    /// Move `original` to its temporary name
    ///
    /// # Errors
    /// * `DelegateError::SetAsideFailed` - If the rename fails
    pub fn acquire(original: &Path) -> Result<Self, DelegateError> {
        let temporary = temporary_path(original);
        fs::rename(original, &temporary).map_err(|source| DelegateError::SetAsideFailed {
            path: original.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            "Set aside {} as {}",
            original.display(),
            temporary.display()
        );
        Ok(Self {
            original: original.to_path_buf(),
            temporary,
        })
    }

    pub fn original(&self) -> &Path {
        &self.original
    }

    pub fn temporary(&self) -> &Path {
        &self.temporary
    }
}

impl Drop for SetAside {
    fn drop(&mut self) {
        match fs::rename(&self.temporary, &self.original) {
            Ok(()) => tracing::debug!("Restored {}", self.original.display()),
            Err(e) => tracing::warn!(
                "Failed to restore {} from {}: {}",
                self.original.display(),
                self.temporary.display(),
                e
            ),
        }
    }
}

/// `magefile.go` -> `magefile.go.tmp`
pub fn temporary_path(original: &Path) -> PathBuf {
    let mut name = original.as_os_str().to_os_string();
    name.push(SET_ASIDE_SUFFIX);
    PathBuf::from(name)
}
