//! Error types for the chgo CLI.
//!
//! `ChgoError` covers every failure of an activation or listing. Each variant
//! names the phase that failed and the release involved so that a single
//! line is enough to act on. The command layer wraps these in
//! `anyhow::Error` for reporting.

use std::path::PathBuf;
use thiserror::Error;

use crate::release::{ParseReleaseError, Release};
use crate::toolchain::activate::Phase;
use crate::toolchain::process::ProcessError;

/// Consolidated error type for chgo operations.
#[derive(Debug, Error)]
pub enum ChgoError {
    /// The requested identifier is not a valid release.
    #[error("invalid version {input:?}")]
    InvalidVersion {
        /// The identifier after prefix normalization.
        input: String,
        /// Why the grammar rejected it.
        #[source]
        source: ParseReleaseError,
    },

    /// The release listing contained no stable release.
    #[error("no stable versions were listed")]
    NoStableReleases,

    /// The release listing could not be fetched or decoded.
    #[error("list releases: {message}")]
    Listing {
        /// Description of what went wrong.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Installing the release wrapper failed.
    #[error("install {release}")]
    InstallFailed {
        release: Release,
        #[source]
        source: ProcessError,
    },

    /// Downloading the release SDK failed.
    #[error("download {release}")]
    FetchFailed {
        release: Release,
        #[source]
        source: ProcessError,
    },

    /// The current link could not be pointed at the release.
    #[error("symlink {} -> {}", link.display(), target.display())]
    RepointFailed {
        /// The well-known link path.
        link: PathBuf,
        /// The release binary the link should point to.
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation was interrupted.
    #[error("operation cancelled")]
    Cancelled,
}

impl ChgoError {
    /// Creates a new `Listing` error.
    #[must_use]
    pub fn listing(message: impl Into<String>) -> Self {
        Self::Listing {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `Listing` error with a source error.
    #[must_use]
    pub fn listing_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Listing {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the activation phase this error halted in, if any.
    #[must_use]
    pub const fn phase(&self) -> Option<Phase> {
        match self {
            Self::InvalidVersion { .. } | Self::NoStableReleases | Self::Listing { .. } => {
                Some(Phase::Resolving)
            }
            Self::InstallFailed { .. } => Some(Phase::Installing),
            Self::FetchFailed { .. } => Some(Phase::Fetching),
            Self::RepointFailed { .. } => Some(Phase::Repointing),
            Self::Cancelled => None,
        }
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
