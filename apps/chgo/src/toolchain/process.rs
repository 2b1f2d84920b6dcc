//! Subprocess collaborators for installing and downloading Go releases.
//!
//! Two steps of an activation shell out to the Go tooling:
//!
//! - install: `go install golang.org/dl/<release>@latest` places a small
//!   wrapper binary named after the release in `GOBIN`
//! - fetch: `<GOBIN>/<release> download` makes that wrapper download the full
//!   SDK into `~/sdk/<release>`
//!
//! Both are cancellable. When the cancellation token fires, the child process
//! is killed and [`ProcessError::Cancelled`] is returned.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::release::Release;

/// Module path hosting the per-release wrapper commands.
const DL_MODULE: &str = "golang.org/dl";

/// Failure of an external command.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The command could not be started or waited on.
    #[error("failed to run {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully.
    #[error("{} exited with {status}", program.display())]
    Exit { program: PathBuf, status: ExitStatus },

    /// The command was killed because the operation was cancelled.
    #[error("process was cancelled")]
    Cancelled,
}

/// Installs the wrapper binary for a release.
pub trait Installer {
    /// Installs `release` into the binary directory.
    async fn install(
        &self,
        cancel: &CancellationToken,
        release: Release,
    ) -> Result<(), ProcessError>;
}

/// Downloads the SDK payload behind a release wrapper.
pub trait Fetcher {
    /// Runs the wrapper at `binary` so it downloads its SDK.
    async fn fetch(&self, cancel: &CancellationToken, binary: &Path) -> Result<(), ProcessError>;
}

/// Runs the real `go` tooling.
#[derive(Debug, Clone)]
pub struct GoCommand {
    go: PathBuf,
    gobin: PathBuf,
}

impl GoCommand {
    /// Creates a runner using the `go` binary at `go`, installing into `gobin`.
    #[must_use]
    pub fn new(go: PathBuf, gobin: PathBuf) -> Self {
        Self { go, gobin }
    }

    /// Arguments passed to `go` to install the wrapper for `release`.
    #[must_use]
    pub fn install_args(release: Release) -> [String; 2] {
        [
            "install".to_string(),
            format!("{DL_MODULE}/{release}@latest"),
        ]
    }
}

impl Installer for GoCommand {
    async fn install(
        &self,
        cancel: &CancellationToken,
        release: Release,
    ) -> Result<(), ProcessError> {
        let mut cmd = Command::new(&self.go);
        cmd.args(Self::install_args(release)).env("GOBIN", &self.gobin);
        run(cmd, &self.go, cancel).await
    }
}

impl Fetcher for GoCommand {
    async fn fetch(&self, cancel: &CancellationToken, binary: &Path) -> Result<(), ProcessError> {
        let mut cmd = Command::new(binary);
        cmd.arg("download");
        run(cmd, binary, cancel).await
    }
}

/// Runs `cmd` to completion with inherited stdio, killing it on cancellation.
///
/// # Errors
///
/// Returns an error if the command cannot be spawned, exits unsuccessfully,
/// or `cancel` fires first.
pub async fn run(
    mut cmd: Command,
    program: &Path,
    cancel: &CancellationToken,
) -> Result<(), ProcessError> {
    if cancel.is_cancelled() {
        return Err(ProcessError::Cancelled);
    }

    cmd.kill_on_drop(true);
    debug!(program = %program.display(), "spawning");

    let spawn_error = |source| ProcessError::Spawn {
        program: program.to_path_buf(),
        source,
    };

    let mut child = cmd.spawn().map_err(spawn_error)?;

    let waited = tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        status = child.wait() => Some(status),
    };

    let Some(status) = waited else {
        if let Err(err) = child.kill().await {
            debug!(
                program = %program.display(),
                error = %err,
                "failed to kill cancelled process"
            );
        }
        return Err(ProcessError::Cancelled);
    };

    let status = status.map_err(spawn_error)?;
    if status.success() {
        Ok(())
    } else {
        Err(ProcessError::Exit {
            program: program.to_path_buf(),
            status,
        })
    }
}
