//! Path conventions for Go release installations.
//!
//! ## Directory Structure
//!
//! ```text
//! $GOBIN/                     # Binary directory (GOBIN, GOPATH/bin or ~/go/bin)
//!   go1.21.3                  # Release wrapper installed by `go install golang.org/dl/...`
//!   go1.22rc1
//!   gotip
//! ~/sdk/                      # SDK root, populated by `<wrapper> download`
//!   go1.21.3/
//!   go1.22rc1/
//! ~/bin/
//!   go -> $GOBIN/go1.21.3     # The current link
//! ```
//!
//! `ToolchainPaths` only builds paths. Locating `GOBIN` and the home directory
//! from the environment happens once in [`crate::config`].

use std::env::consts::EXE_SUFFIX;
use std::path::{Path, PathBuf};

use crate::release::Release;

/// Name of the current link inside `~/bin`, without executable suffix.
pub const CURRENT_LINK_NAME: &str = "go";

/// Name of the SDK root inside the home directory.
const SDK_DIR_NAME: &str = "sdk";

/// Paths used when activating a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainPaths {
    /// Directory holding the per-release wrapper binaries.
    pub gobin: PathBuf,
    /// Directory the wrappers download SDKs into.
    pub sdk: PathBuf,
    /// The single link that makes one release current.
    pub current: PathBuf,
}

impl ToolchainPaths {
    /// Creates paths rooted at `home` with wrappers living in `gobin`.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_home(home: &Path, gobin: PathBuf) -> Self {
        Self {
            gobin,
            sdk: home.join(SDK_DIR_NAME),
            current: home
                .join("bin")
                .join(format!("{CURRENT_LINK_NAME}{EXE_SUFFIX}")),
        }
    }

    /// Returns the path of the wrapper binary for `release`.
    #[must_use = "returns the path without side effects"]
    pub fn binary_path(&self, release: Release) -> PathBuf {
        self.gobin.join(format!("{release}{EXE_SUFFIX}"))
    }

    /// Returns the directory the SDK for `release` is downloaded into.
    #[must_use = "returns the path without side effects"]
    pub fn sdk_dir(&self, release: Release) -> PathBuf {
        self.sdk.join(release.to_string())
    }
}
