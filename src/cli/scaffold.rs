//! Starter magefile for `magefilehub init`

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Contents written by `init`
pub const STARTER_MAGEFILE: &str = r#"//go:build mage

package main

import (
	"fmt"
	"os"

	"github.com/magefile/mage/mg"
)

// Deploy is a custom deployment command
func Deploy() error {
	fmt.Println("deploying with args:", os.Getenv("MAGE_ARGS"))
	return nil
}

// Build namespace
type Build mg.Namespace

// Linux builds for linux
func (Build) Linux() error {
	return nil
}
"#;

/// Write the starter magefile into `root`
///
/// # Errors
/// Fails with `io::ErrorKind::AlreadyExists` instead of overwriting.
pub fn write_starter(root: &Path, file_name: &str) -> io::Result<PathBuf> {
    let path = root.join(file_name);
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;
    file.write_all(STARTER_MAGEFILE.as_bytes())?;
    tracing::debug!("Wrote starter magefile to {}", path.display());
    Ok(path)
}
