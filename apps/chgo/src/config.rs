//! Runtime configuration for chgo.
//!
//! Everything chgo reads from the environment is resolved here, once, before
//! any command runs.
//!
//! ## Environment Variables
//!
//! - `GOBIN`: directory release wrappers are installed into
//! - `GOPATH`: its first entry plus `/bin` is used when `GOBIN` is unset
//! - `CHGO_GO`: `go` binary used to install wrappers
//! - `CHGO_DIST_SERVER`: server hosting the download feed
//! - `CHGO_TREE_URL`: git tree API URL of the `golang/dl` repository
//!
//! Empty values count as unset.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::toolchain::listing::{DEFAULT_DIST_SERVER, DEFAULT_TREE_URL};
use crate::toolchain::paths::ToolchainPaths;

const GOBIN_ENV: &str = "GOBIN";
const GOPATH_ENV: &str = "GOPATH";
const GO_ENV: &str = "CHGO_GO";
const DIST_SERVER_ENV: &str = "CHGO_DIST_SERVER";
const TREE_URL_ENV: &str = "CHGO_TREE_URL";

/// `go` binary used when none is configured or found in `PATH`.
const FALLBACK_GO: &str = "/usr/local/bin/go";

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub paths: ToolchainPaths,
    /// `go` binary used to install release wrappers.
    pub go: PathBuf,
    pub dist_server: String,
    pub tree_url: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self::resolve(
            &home,
            |key| std::env::var(key).ok(),
            || which::which("go").ok(),
        ))
    }

    /// Builds the configuration from `home` and a variable lookup.
    ///
    /// `find_go` is only consulted when `CHGO_GO` is unset.
    fn resolve(
        home: &Path,
        var: impl Fn(&str) -> Option<String>,
        find_go: impl FnOnce() -> Option<PathBuf>,
    ) -> Self {
        let lookup = |key: &str| non_empty(var(key));

        let gobin = lookup(GOBIN_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                lookup(GOPATH_ENV)
                    .and_then(|gopath| std::env::split_paths(&gopath).next())
                    .filter(|first| !first.as_os_str().is_empty())
                    .map(|first| first.join("bin"))
            })
            .unwrap_or_else(|| home.join("go").join("bin"));

        let go = lookup(GO_ENV)
            .map(PathBuf::from)
            .or_else(find_go)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_GO));

        let url = |key: &str, default: &str| {
            lookup(key).map_or_else(
                || default.to_string(),
                |value| value.trim_end_matches('/').to_string(),
            )
        };

        Self {
            paths: ToolchainPaths::with_home(home, gobin),
            go,
            dist_server: url(DIST_SERVER_ENV, DEFAULT_DIST_SERVER),
            tree_url: url(TREE_URL_ENV, DEFAULT_TREE_URL),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
