//! Filesystem collaborator used by activation.
//!
//! Activation only needs a handful of operations: existence checks, reading
//! and creating the current symlink, and removing a stale one. They sit behind
//! [`Filesystem`] so the activation steps can be exercised without touching
//! the real home directory.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failure to create a symbolic link.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Something already exists at the link path.
    #[error("link already exists")]
    AlreadyExists,

    /// Any other failure.
    #[error(transparent)]
    Other(io::Error),
}

impl From<io::Error> for LinkError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::AlreadyExists {
            Self::AlreadyExists
        } else {
            Self::Other(err)
        }
    }
}

/// Filesystem operations needed to activate a release.
pub trait Filesystem {
    /// Returns true if anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns the target of the symlink at `path`, or `None` if `path` is not
    /// a symlink.
    fn read_link(&self, path: &Path) -> Option<PathBuf>;

    /// Creates `dir` and its parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Creates a symlink at `link` pointing to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::AlreadyExists`] if `link` is taken.
    fn symlink(&self, target: &Path, link: &Path) -> Result<(), LinkError>;

    /// Removes the entry at `path`. A missing entry is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists and cannot be removed.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFilesystem;

impl Filesystem for OsFilesystem {
    fn exists(&self, path: &Path) -> bool {
        // symlink_metadata so a dangling link still counts as present
        path.symlink_metadata().is_ok()
    }

    fn read_link(&self, path: &Path) -> Option<PathBuf> {
        std::fs::read_link(path).ok()
    }

    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn symlink(&self, target: &Path, link: &Path) -> Result<(), LinkError> {
        create_link(target, link).map_err(LinkError::from)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}
