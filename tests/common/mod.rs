//! Common test utilities for magefilehub tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates a temporary directory with a root magefile.go
pub fn create_magefile_project(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("magefile.go"), content).expect("Failed to write magefile.go");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Creates a temporary directory with a magefiles/ directory
pub fn create_magefiles_project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let magefiles = dir.path().join("magefiles");
    std::fs::create_dir(&magefiles).expect("Failed to create magefiles/");
    for (name, content) in files {
        std::fs::write(magefiles.join(name), content).expect("Failed to write magefile source");
    }
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Creates a temporary directory with both conventions present
pub fn create_conflicting_project() -> (TempDir, PathBuf) {
    let (dir, path) = create_magefiles_project(&[("targets.go", SAMPLE_MAGEFILE)]);
    std::fs::write(path.join("magefile.go"), ROOT_MAGEFILE).expect("Failed to write magefile.go");
    (dir, path)
}

/// Creates a temporary directory with no build files
pub fn create_empty_project() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Writes an executable shell script
#[cfg(unix)]
pub fn write_executable(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    let mut perms = std::fs::metadata(path)
        .expect("Failed to get metadata")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("Failed to set permissions");
}

/// Installs a stand-in for the mage binary into `bin`
///
/// It records what it was asked to run into `record`:
/// `target`, `args` (MAGE_ARGS), `cwd`, and which magefile names were visible.
#[cfg(unix)]
pub fn install_fake_mage(bin: &Path, record: &Path) -> PathBuf {
    let path = bin.join("mage");
    let body = FAKE_MAGE.replace("@RECORD@", &record.display().to_string());
    write_executable(&path, &body);
    path
}

/// Installs a stand-in for the go toolchain that records its arguments
#[cfg(unix)]
pub fn install_fake_go(bin: &Path, record: &Path) -> PathBuf {
    let path = bin.join("go");
    let body = format!(
        "printf '%s\\n' \"$@\" > '{rec}/go_args'\npwd > '{rec}/cwd'\nprintf '%s' \"$MAGE_ARGS\" > '{rec}/args'",
        rec = record.display()
    );
    write_executable(&path, &body);
    path
}

/// Reads a file written by a fake runner, trimmed
pub fn read_record(record: &Path, name: &str) -> String {
    std::fs::read_to_string(record.join(name))
        .unwrap_or_default()
        .trim()
        .to_string()
}

const FAKE_MAGE: &str = r#"rec='@RECORD@'
printf '%s' "$1" > "$rec/target"
printf '%s' "$MAGE_ARGS" > "$rec/args"
pwd > "$rec/cwd"
if [ -e magefile.go ]; then echo yes > "$rec/saw_magefile"; else echo no > "$rec/saw_magefile"; fi
if [ -e magefile.go.tmp ]; then echo yes > "$rec/saw_tmp"; else echo no > "$rec/saw_tmp"; fi
case "$1" in
    DeployApp|deployApp|deployapp)
        echo "deploying"
        ;;
    pipelinecI|pipelineci)
        echo "running ci"
        ;;
    fail)
        echo "Error: boom" >&2
        exit 2
        ;;
    silentFail|silentfail)
        exit 5
        ;;
    noisy)
        echo "Unknown target specified: \"noisy\"" >&2
        echo "real problem" >&2
        exit 1
        ;;
    slow)
        exec sleep 30
        ;;
    lingering)
        sleep 5 &
        echo "started"
        ;;
    lingeringFail)
        echo "warming up" >&2
        sleep 5 &
        exit 4
        ;;
    *)
        echo "Unknown target specified: \"$1\"" >&2
        exit 2
        ;;
esac
"#;

/// Sample magefile with a function and a namespaced method
pub const SAMPLE_MAGEFILE: &str = r#"//go:build mage

package main

import (
	"fmt"

	"github.com/magefile/mage/mg"
)

// DeployApp deploys the application
func DeployApp() error {
	fmt.Println("Deploying...")
	return nil
}

// Pipeline groups CI targets
type Pipeline mg.Namespace

// CI runs the CI pipeline
func (Pipeline) CI() error {
	return nil
}

func helper() {}
"#;

/// Single-file magefile used alongside magefiles/ in conflict tests
pub const ROOT_MAGEFILE: &str = r#"//go:build mage

package main

// Legacy is the old single-file target
func Legacy() error {
	return nil
}
"#;

/// Magefile that does not parse
pub const BROKEN_MAGEFILE: &str = "package main\n\nfunc Broken( {\n";
