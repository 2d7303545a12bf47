//! End-to-end tests of the magefilehub binary

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::*;

fn magefilehub() -> Command {
    let mut cmd = Command::cargo_bin("magefilehub").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("MAGEFILEHUB_VERBOSE")
        .env_remove("CLICOLOR_FORCE")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_list_table() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    magefilehub()
        .current_dir(&path)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("deployapp"))
        .stdout(predicate::str::contains("pipeline:ci"))
        .stdout(predicate::str::contains("helper").not());
}

#[test]
fn test_list_json_with_dir_flag() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    let output = magefilehub()
        .args(["list", "-f", "json", "-C"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let commands = json["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[1]["original_name"], "Pipeline:CI");
    assert_eq!(json["location"]["type"], "single_file");
}

#[test]
fn test_list_namespace_filter() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    magefilehub()
        .current_dir(&path)
        .args(["list", "-f", "plain", "-n", "PIPELINE"])
        .assert()
        .success()
        .stdout("pipeline:ci\n");
}

#[test]
fn test_list_broken_magefile_fails() {
    let (_dir, path) = create_magefile_project(BROKEN_MAGEFILE);

    magefilehub()
        .current_dir(&path)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn test_search_plain() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    magefilehub()
        .current_dir(&path)
        .args(["search", "DEPLOY", "-f", "plain"])
        .assert()
        .success()
        .stdout("deployapp\n");
}

#[test]
fn test_search_without_matches_suggests_near_misses() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    magefilehub()
        .current_dir(&path)
        .args(["search", "deplyapp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No targets found matching 'deplyapp'"))
        .stdout(predicate::str::contains("Did you mean:"))
        .stdout(predicate::str::contains("deployapp - DeployApp deploys the application"));
}

#[test]
fn test_search_without_matches_plain_is_empty() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    magefilehub()
        .current_dir(&path)
        .args(["search", "deplyapp", "-f", "plain"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_list_grouped_by_namespace() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    magefilehub()
        .current_dir(&path)
        .args(["list", "--grouped"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Targets:"))
        .stdout(predicate::str::contains("pipeline:\n  pipeline:ci  - CI runs the CI pipeline"));
}

#[test]
fn test_list_grouped_json() {
    let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);

    let output = magefilehub()
        .current_dir(&path)
        .args(["list", "--grouped", "-f", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["namespaces"][""][0]["original_name"], "DeployApp");
    assert_eq!(json["namespaces"]["pipeline"][0]["original_name"], "Pipeline:CI");
}

#[test]
fn test_run_without_magefile() {
    let (_dir, path) = create_empty_project();

    magefilehub()
        .current_dir(&path)
        .args(["run", "deploy"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "command not found and no magefile.go exists: deploy",
        ));
}

#[test]
fn test_locate_plain() {
    let (_dir, path) = create_magefiles_project(&[("targets.go", SAMPLE_MAGEFILE)]);

    magefilehub()
        .current_dir(&path)
        .args(["locate", "-f", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("magefiles\n"));
}

#[test]
fn test_init_creates_once() {
    let (_dir, path) = create_empty_project();

    magefilehub()
        .current_dir(&path)
        .arg("init")
        .assert()
        .success();
    assert!(path.join("magefile.go").is_file());

    magefilehub()
        .current_dir(&path)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create magefile.go"));
}

#[test]
fn test_config_json_reflects_env() {
    let (_dir, path) = create_empty_project();

    let output = magefilehub()
        .current_dir(&path)
        .env("MAGEFILEHUB_DELEGATE__TIMEOUT", "42")
        .args(["config", "-f", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["delegate"]["timeout"], 42);
    assert_eq!(json["discovery"]["file"], "magefile.go");
}

#[test]
fn test_project_config_follows_dir_flag() {
    let (_dir, path) = create_empty_project();
    std::fs::write(path.join(".magefilehub.toml"), "[delegate]\ntimeout = 17\n").unwrap();
    let (_elsewhere, cwd) = create_empty_project();

    let output = magefilehub()
        .current_dir(&cwd)
        .args(["config", "-f", "json", "-C"])
        .arg(&path)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["delegate"]["timeout"], 17);
}

#[cfg(unix)]
mod delegation {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_mirrors_exit_code() {
        let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);
        let bin = TempDir::new().unwrap();
        let record = TempDir::new().unwrap();
        let mage = install_fake_mage(bin.path(), record.path());

        magefilehub()
            .current_dir(&path)
            .env("MAGEFILEHUB_DELEGATE__RUNNER", &mage)
            .args(["run", "fail"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Error: boom"));
    }

    #[test]
    fn test_run_passes_args() {
        let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);
        let bin = TempDir::new().unwrap();
        let record = TempDir::new().unwrap();
        let mage = install_fake_mage(bin.path(), record.path());

        magefilehub()
            .current_dir(&path)
            .env("MAGEFILEHUB_DELEGATE__RUNNER", &mage)
            .args(["run", "DEPLOYAPP", "prod", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("deploying"));

        assert_eq!(read_record(record.path(), "target"), "DeployApp");
        assert_eq!(read_record(record.path(), "args"), "prod --dry-run");
    }

    #[test]
    fn test_run_timeout_exit_code() {
        let (_dir, path) = create_magefile_project(SAMPLE_MAGEFILE);
        let bin = TempDir::new().unwrap();
        let record = TempDir::new().unwrap();
        let mage = install_fake_mage(bin.path(), record.path());

        magefilehub()
            .current_dir(&path)
            .env("MAGEFILEHUB_DELEGATE__RUNNER", &mage)
            .args(["run", "--timeout", "1", "slow"])
            .assert()
            .code(124)
            .stderr(predicate::str::contains("timed out"));
    }
}
