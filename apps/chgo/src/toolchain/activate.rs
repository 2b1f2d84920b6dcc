//! Release activation.
//!
//! Activating a release makes it the one `~/bin/go` runs. It is a short
//! sequence of steps, each skipped when its result is already in place:
//!
//! ```text
//! Resolving -> Installing -> Fetching -> Repointing -> Done
//! ```
//!
//! - **Resolving** turns the requested identifier into a [`Release`]. `latest`
//!   asks the release lister for the newest stable release.
//! - **Installing** runs `go install golang.org/dl/<release>@latest` unless the
//!   wrapper binary already exists in `GOBIN`.
//! - **Fetching** runs `<wrapper> download` unless `~/sdk/<release>` exists.
//! - **Repointing** points `~/bin/go` at the wrapper.
//!
//! A failing step stops the sequence. Earlier steps are not rolled back;
//! running the activation again resumes where it stopped.
//!
//! Both existence checks look only for an entry with the right name, so a
//! corrupt install is not detected.
//!
//! ## Concurrency
//!
//! The current link is not locked. Two activations running at once can both
//! remove and recreate it, and the last one to create it wins. Each run is
//! idempotent on its own, so the link always ends up pointing at one of the
//! requested releases.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::fs::{Filesystem, LinkError};
use super::listing::{ReleaseLister, stable_releases};
use super::paths::ToolchainPaths;
use super::process::{Fetcher, Installer, ProcessError};
use crate::errors::ChgoError;
use crate::release::{self, Release};

/// Identifier resolving to the newest stable release.
pub const LATEST: &str = "latest";

/// Extra attempts at creating the current link after finding it taken.
const RELINK_RETRIES: u32 = 1;

/// Step of an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Resolving,
    Installing,
    Fetching,
    Repointing,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolving => "resolving",
            Self::Installing => "installing",
            Self::Fetching => "fetching",
            Self::Repointing => "repointing",
            Self::Done => "done",
        })
    }
}

/// What to do with the current link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepointAction {
    /// The link already points at the release.
    Keep,
    /// No link exists yet.
    Create,
    /// The link points at another target and must be replaced.
    Replace {
        /// Where the link pointed before.
        stale: PathBuf,
    },
}

/// Decides how to make the current link point at `desired`.
///
/// `existing` is the current target of the link, or `None` when there is no
/// symlink at that name.
#[must_use]
pub fn plan_repoint(desired: &Path, existing: Option<&Path>) -> RepointAction {
    match existing {
        None => RepointAction::Create,
        Some(current) if current == desired => RepointAction::Keep,
        Some(current) => RepointAction::Replace {
            stale: current.to_path_buf(),
        },
    }
}

/// Result of a completed activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// The release that is now current.
    pub release: Release,
    /// Whether the wrapper had to be installed.
    pub installed: bool,
    /// Whether the SDK had to be downloaded.
    pub fetched: bool,
    /// What was done to the current link.
    pub repoint: RepointAction,
}

/// Drives activations using injected collaborators.
#[derive(Debug)]
pub struct Activator<L, I, F, S> {
    paths: ToolchainPaths,
    lister: L,
    installer: I,
    fetcher: F,
    fs: S,
}

impl<L, I, F, S> Activator<L, I, F, S>
where
    L: ReleaseLister,
    I: Installer,
    F: Fetcher,
    S: Filesystem,
{
    #[must_use]
    pub fn new(paths: ToolchainPaths, lister: L, installer: I, fetcher: F, fs: S) -> Self {
        Self {
            paths,
            lister,
            installer,
            fetcher,
            fs,
        }
    }

    /// Makes `requested` the current release.
    ///
    /// Returns `Ok(None)` without doing anything when `requested` is empty.
    ///
    /// # Errors
    ///
    /// Returns the [`ChgoError`] of the first step that fails. Cancellation is
    /// reported as [`ChgoError::Cancelled`] and prevents any later step.
    pub async fn activate(
        &self,
        cancel: &CancellationToken,
        requested: &str,
    ) -> Result<Option<Activation>, ChgoError> {
        let requested = requested.trim();
        if requested.is_empty() {
            debug!("no version requested");
            return Ok(None);
        }

        let release = self.resolve(cancel, requested).await?;
        debug!(requested, %release, "resolved");

        let installed = self.ensure_installed(cancel, release).await?;
        let fetched = self.ensure_fetched(cancel, release).await?;
        let repoint = self.repoint(cancel, release)?;

        debug!(phase = %Phase::Done, %release, installed, fetched, "activation finished");

        Ok(Some(Activation {
            release,
            installed,
            fetched,
            repoint,
        }))
    }

    /// Resolves `requested` to a concrete release.
    ///
    /// # Errors
    ///
    /// Returns [`ChgoError::NoStableReleases`] if `latest` was requested and
    /// the lister reports no stable release, or
    /// [`ChgoError::InvalidVersion`] if `requested` does not parse.
    pub async fn resolve(
        &self,
        cancel: &CancellationToken,
        requested: &str,
    ) -> Result<Release, ChgoError> {
        if cancel.is_cancelled() {
            return Err(ChgoError::Cancelled);
        }

        if requested == LATEST {
            let listed = self.lister.list(cancel).await?;
            return stable_releases(&listed)
                .latest()
                .ok_or(ChgoError::NoStableReleases);
        }

        let input = release::normalize(requested);
        match input.parse() {
            Ok(release) => Ok(release),
            Err(source) => Err(ChgoError::InvalidVersion {
                input: input.into_owned(),
                source,
            }),
        }
    }

    /// Installs the wrapper for `release` if it is missing.
    ///
    /// Returns whether an install ran.
    async fn ensure_installed(
        &self,
        cancel: &CancellationToken,
        release: Release,
    ) -> Result<bool, ChgoError> {
        let binary = self.paths.binary_path(release);
        if self.fs.exists(&binary) {
            debug!(phase = %Phase::Installing, path = %binary.display(), "already installed");
            return Ok(false);
        }

        info!("go install golang.org/dl/{release}@latest");
        self.installer
            .install(cancel, release)
            .await
            .map_err(|err| step_error(err, |source| ChgoError::InstallFailed { release, source }))?;

        Ok(true)
    }

    /// Downloads the SDK for `release` if it is missing.
    ///
    /// Returns whether a download ran.
    async fn ensure_fetched(
        &self,
        cancel: &CancellationToken,
        release: Release,
    ) -> Result<bool, ChgoError> {
        let sdk = self.paths.sdk_dir(release);
        if self.fs.exists(&sdk) {
            debug!(phase = %Phase::Fetching, path = %sdk.display(), "already downloaded");
            return Ok(false);
        }

        let binary = self.paths.binary_path(release);
        info!("{} download", binary.display());
        self.fetcher
            .fetch(cancel, &binary)
            .await
            .map_err(|err| step_error(err, |source| ChgoError::FetchFailed { release, source }))?;

        Ok(true)
    }

    /// Points the current link at the wrapper for `release`.
    fn repoint(
        &self,
        cancel: &CancellationToken,
        release: Release,
    ) -> Result<RepointAction, ChgoError> {
        if cancel.is_cancelled() {
            return Err(ChgoError::Cancelled);
        }

        let target = self.paths.binary_path(release);
        let link = &self.paths.current;
        let action = plan_repoint(&target, self.fs.read_link(link).as_deref());
        debug!(phase = %Phase::Repointing, ?action, "planned link update");

        let fail = |source: io::Error| ChgoError::RepointFailed {
            link: link.clone(),
            target: target.clone(),
            source,
        };

        match action {
            RepointAction::Keep => return Ok(action),
            RepointAction::Create => {
                if let Some(parent) = link.parent() {
                    self.fs.create_dir_all(parent).map_err(fail)?;
                }
            }
            RepointAction::Replace { .. } => self.fs.remove(link).map_err(fail)?,
        }

        info!("linking {} as {}", target.display(), link.display());
        self.create_link(&target, link).map_err(fail)?;

        Ok(action)
    }

    /// Creates the link, replacing whatever took its name in the meantime.
    fn create_link(&self, target: &Path, link: &Path) -> io::Result<()> {
        let mut retries = RELINK_RETRIES;
        loop {
            match self.fs.symlink(target, link) {
                Ok(()) => return Ok(()),
                Err(LinkError::AlreadyExists) if retries > 0 => {
                    retries -= 1;
                    debug!(link = %link.display(), "link taken, replacing");
                    self.fs.remove(link)?;
                }
                Err(LinkError::AlreadyExists) => {
                    return Err(io::Error::from(io::ErrorKind::AlreadyExists));
                }
                Err(LinkError::Other(err)) => return Err(err),
            }
        }
    }
}

/// Wraps a subprocess failure, keeping cancellation distinguishable.
fn step_error(err: ProcessError, wrap: impl FnOnce(ProcessError) -> ChgoError) -> ChgoError {
    match err {
        ProcessError::Cancelled => ChgoError::Cancelled,
        other => wrap(other),
    }
}
