#![warn(clippy::pedantic)]

//! Integration tests for the chgo binary.
//!
//! These tests spawn the compiled executable with an isolated `HOME` and
//! `GOBIN` and check its exit code, output and the links it leaves behind.
//!
//! ## Test Strategy
//!
//! 1. **Help and version**: CLI metadata display
//! 2. **Argument validation**: invalid releases and filters fail without
//!    touching the network
//! 3. **Activation**: preinstalled releases are linked, missing ones are
//!    installed through a stand-in `go` script
//! 4. **Listing**: unreachable servers produce an error naming the server
//!
//! ## Test Infrastructure
//!
//! - Uses `assert_cmd` for spawning and asserting on command execution
//! - Uses `assert_fs` for temporary home directories
//! - Uses `predicates` for flexible output matching
//!
//! Nothing here reaches the real network: every URL points at a closed
//! local port.

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

/// A local address nothing listens on.
const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Builds a `chgo` command confined to `home`.
fn chgo(home: &assert_fs::TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("chgo"));
    cmd.env("HOME", home.path())
        .env("GOBIN", home.path().join("gobin"))
        .env("CHGO_GO", home.path().join("no-go-here"))
        .env("CHGO_DIST_SERVER", UNREACHABLE)
        .env("CHGO_TREE_URL", format!("{UNREACHABLE}/tree"))
        .env_remove("GOPATH")
        .env_remove("RUST_LOG")
        .env_remove("CHGO_LOG_JSON");
    cmd
}

/// Lays out `release` as if it had been installed and downloaded before.
fn preinstall(home: &assert_fs::TempDir, release: &str) {
    home.child("gobin").create_dir_all().unwrap();
    home.child("gobin").child(release).touch().unwrap();
    home.child("sdk").child(release).create_dir_all().unwrap();
}

fn current_link(home: &assert_fs::TempDir) -> std::path::PathBuf {
    home.path().join("bin").join("go")
}

// =============================================================================
// Help and Version
// =============================================================================

/// Verifies that `chgo --help` documents the list flag and environment.
#[test]
fn help_shows_usage() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--list"))
        .stdout(predicate::str::contains("CHGO_DIST_SERVER"));
}

#[test]
fn version_flag_shows_version() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chgo"));
}

// =============================================================================
// Argument Validation
// =============================================================================

/// Verifies that running without a release does nothing and succeeds.
#[test]
fn no_release_is_a_no_op() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home).assert().success().stdout(predicate::str::is_empty());

    assert!(!current_link(&home).exists());
}

/// Verifies that an invalid release is rejected before anything is installed.
#[test]
fn invalid_release_fails() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .arg("1.x")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid version \"go1.x\""));

    assert!(!home.path().join("bin").exists());
}

/// Verifies that an invalid list filter is rejected without a request.
#[test]
fn list_rejects_invalid_filter() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .args(["--list", "banana"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid version \"gobanana\""));
}

// =============================================================================
// Listing
// =============================================================================

/// Verifies that an unreachable tree URL is reported with the URL.
#[test]
fn list_without_network_shows_error() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .arg("-l")
        .assert()
        .failure()
        .stderr(predicate::str::contains("127.0.0.1:9/tree"));
}

/// Verifies that `--list latest` asks the download feed, not the tree.
#[test]
fn list_latest_uses_dist_server() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .args(["--list", "latest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("127.0.0.1:9/dl/?mode=json"));
}

/// Verifies that activating `latest` fails cleanly when the feed is down.
#[test]
fn activate_latest_without_network_shows_error() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .arg("latest")
        .assert()
        .failure()
        .stderr(predicate::str::contains("list releases"));

    assert!(!current_link(&home).exists());
}

// =============================================================================
// Activation
// =============================================================================

/// Verifies that a preinstalled release is linked without running `go`.
#[cfg(unix)]
#[test]
fn preinstalled_release_is_linked() {
    let home = assert_fs::TempDir::new().unwrap();
    preinstall(&home, "go1.21.3");

    chgo(&home).arg("1.21.3").assert().success();

    assert_eq!(
        std::fs::read_link(current_link(&home)).unwrap(),
        home.path().join("gobin").join("go1.21.3")
    );
}

/// Verifies that activating the current release again changes nothing.
#[cfg(unix)]
#[test]
fn activation_is_idempotent() {
    let home = assert_fs::TempDir::new().unwrap();
    preinstall(&home, "go1.21.3");

    chgo(&home).arg("go1.21.3").assert().success();
    chgo(&home).arg("go1.21.3").assert().success();

    assert_eq!(
        std::fs::read_link(current_link(&home)).unwrap(),
        home.path().join("gobin").join("go1.21.3")
    );
}

/// Verifies that switching releases repoints the existing link.
#[cfg(unix)]
#[test]
fn switching_releases_replaces_link() {
    let home = assert_fs::TempDir::new().unwrap();
    preinstall(&home, "go1.21.3");
    preinstall(&home, "go1.22rc1");

    chgo(&home).arg("1.21.3").assert().success();
    chgo(&home).arg("1.22rc1").assert().success();

    assert_eq!(
        std::fs::read_link(current_link(&home)).unwrap(),
        home.path().join("gobin").join("go1.22rc1")
    );
}

/// Verifies that a failing install is reported and leaves no link.
#[cfg(unix)]
#[test]
fn install_failure_is_reported() {
    let home = assert_fs::TempDir::new().unwrap();

    chgo(&home)
        .arg("1.21.3")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("install go1.21.3"));

    assert!(!current_link(&home).exists());
}

/// Verifies the whole sequence against a stand-in `go` that writes a
/// wrapper which in turn creates the SDK directory.
#[cfg(unix)]
#[test]
fn missing_release_is_installed_and_downloaded() {
    use std::os::unix::fs::PermissionsExt;

    let home = assert_fs::TempDir::new().unwrap();
    let go = home.child("fake-go");
    go.write_str(
        r#"#!/bin/sh
[ "$1" = "install" ] || exit 2
release=${2#golang.org/dl/}
release=${release%@latest}
mkdir -p "$GOBIN"
printf '#!/bin/sh\n[ "$1" = "download" ] && mkdir -p "%s/sdk/%s"\n' "$HOME" "$release" > "$GOBIN/$release"
chmod +x "$GOBIN/$release"
"#,
    )
    .unwrap();
    std::fs::set_permissions(go.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

    chgo(&home)
        .env("CHGO_GO", go.path())
        .arg("1.21rc2")
        .assert()
        .success();

    home.child("gobin").child("go1.21rc2").assert(predicate::path::exists());
    home.child("sdk").child("go1.21rc2").assert(predicate::path::is_dir());
    assert_eq!(
        std::fs::read_link(current_link(&home)).unwrap(),
        home.path().join("gobin").join("go1.21rc2")
    );
}
