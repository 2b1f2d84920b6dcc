//! Go release identifiers.
//!
//! This module parses the identifiers used by `golang.org/dl` wrappers
//! (`go1.21.3`, `go1.22rc1`, `go1.20beta1`, `gotip`) into a [`Release`],
//! renders them back in canonical form, and orders them.
//!
//! ## Grammar
//!
//! Tried in this order, the whole input must match:
//!
//! ```text
//! gotip                    development tip
//! go1.<minor>.<patch>      final release
//! go1.<minor>beta<n>       beta prerelease
//! go1.<minor>rc<n>         release candidate
//! go1.<minor>              final release, patch 0
//! ```
//!
//! Every number is plain ASCII digits and must fit in a `u8`.
//!
//! ## Ordering
//!
//! Releases sort by minor, then patch, then prerelease rank, then prerelease
//! number. Ranks are `beta < rc < final`, so
//! `go1.21beta1 < go1.21rc1 < go1.21 < go1.21.1`. The tip sorts below every
//! tagged release.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Identifier of the unversioned development build.
pub const TIP: &str = "gotip";

/// Prefix shared by every tagged release.
pub const PREFIX: &str = "go1.";

/// Prefix added to user input that omits it (`1.21.3` -> `go1.21.3`).
const SHORT_PREFIX: &str = "go";

/// Error returned when text does not match the release grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseReleaseError {
    /// No grammar rule matched the input.
    #[error("invalid release identifier {0:?}")]
    InvalidFormat(String),
}

/// Kind of prerelease a release belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrereleaseKind {
    /// A final release.
    None,
    /// A release candidate (`rc<n>`).
    ReleaseCandidate,
    /// A beta (`beta<n>`).
    Beta,
}

impl PrereleaseKind {
    /// Position of this kind in the release ordering.
    ///
    /// Betas come first, then release candidates, then the final release.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Beta => 0,
            Self::ReleaseCandidate => 1,
            Self::None => 2,
        }
    }
}

/// Stage of a tagged release, carrying the prerelease number where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Final,
    Candidate(u8),
    Beta(u8),
}

impl Stage {
    #[must_use]
    pub const fn kind(self) -> PrereleaseKind {
        match self {
            Self::Final => PrereleaseKind::None,
            Self::Candidate(_) => PrereleaseKind::ReleaseCandidate,
            Self::Beta(_) => PrereleaseKind::Beta,
        }
    }

    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Final => 0,
            Self::Candidate(n) | Self::Beta(n) => n,
        }
    }
}

/// A Go toolchain release.
///
/// The default value is the development tip, which has no minor or patch
/// number and sorts below every tagged release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Release {
    /// The unversioned development build (`gotip`).
    #[default]
    Tip,
    /// A numbered release such as `go1.21.3` or `go1.22rc1`.
    Tagged {
        minor: u8,
        patch: u8,
        stage: Stage,
    },
}

impl Release {
    /// Creates a final release `go1.<minor>.<patch>`.
    #[must_use]
    pub const fn new(minor: u8, patch: u8) -> Self {
        Self::Tagged {
            minor,
            patch,
            stage: Stage::Final,
        }
    }

    /// Creates the release candidate `go1.<minor>rc<number>`.
    #[must_use]
    pub const fn candidate(minor: u8, number: u8) -> Self {
        Self::Tagged {
            minor,
            patch: 0,
            stage: Stage::Candidate(number),
        }
    }

    /// Creates the beta `go1.<minor>beta<number>`.
    #[must_use]
    pub const fn beta(minor: u8, number: u8) -> Self {
        Self::Tagged {
            minor,
            patch: 0,
            stage: Stage::Beta(number),
        }
    }

    #[must_use]
    pub const fn is_tip(self) -> bool {
        matches!(self, Self::Tip)
    }

    /// Returns true for tagged releases that are not prereleases.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(
            self,
            Self::Tagged {
                stage: Stage::Final,
                ..
            }
        )
    }

    /// Minor version number; `0` for the tip.
    #[must_use]
    pub const fn minor(self) -> u8 {
        match self {
            Self::Tip => 0,
            Self::Tagged { minor, .. } => minor,
        }
    }

    /// Patch version number; `0` for the tip and for prereleases.
    #[must_use]
    pub const fn patch(self) -> u8 {
        match self {
            Self::Tip => 0,
            Self::Tagged { patch, .. } => patch,
        }
    }

    #[must_use]
    pub const fn prerelease_kind(self) -> PrereleaseKind {
        match self {
            Self::Tip => PrereleaseKind::None,
            Self::Tagged { stage, .. } => stage.kind(),
        }
    }

    /// Prerelease number; only meaningful when [`Self::prerelease_kind`] is
    /// not [`PrereleaseKind::None`].
    #[must_use]
    pub const fn prerelease_number(self) -> u8 {
        match self {
            Self::Tip => 0,
            Self::Tagged { stage, .. } => stage.number(),
        }
    }
}

/// Adds the `go` prefix to user input that lacks it.
///
/// `1.21.3` becomes `go1.21.3`; `go1.21.3` and `gotip` are returned as is.
#[must_use]
pub fn normalize(input: &str) -> Cow<'_, str> {
    if input.starts_with(SHORT_PREFIX) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(format!("{SHORT_PREFIX}{input}"))
    }
}

/// Parses a release identifier.
///
/// # Errors
///
/// Returns [`ParseReleaseError::InvalidFormat`] if `text` matches no grammar
/// rule or a number does not fit in a `u8`.
pub fn parse_release(text: &str) -> Result<Release, ParseReleaseError> {
    let invalid = || ParseReleaseError::InvalidFormat(text.to_string());

    if text == TIP {
        return Ok(Release::Tip);
    }

    let rest = text.strip_prefix(PREFIX).ok_or_else(invalid)?;

    if let Some((minor, patch)) = rest.split_once('.') {
        let minor = number(minor).ok_or_else(invalid)?;
        let patch = number(patch).ok_or_else(invalid)?;
        return Ok(Release::new(minor, patch));
    }

    if let Some((minor, n)) = rest.split_once("beta") {
        let minor = number(minor).ok_or_else(invalid)?;
        let n = number(n).ok_or_else(invalid)?;
        return Ok(Release::beta(minor, n));
    }

    if let Some((minor, n)) = rest.split_once("rc") {
        let minor = number(minor).ok_or_else(invalid)?;
        let n = number(n).ok_or_else(invalid)?;
        return Ok(Release::candidate(minor, n));
    }

    number(rest)
        .map(|minor| Release::new(minor, 0))
        .ok_or_else(invalid)
}

/// Parses a non-empty run of ASCII digits into a `u8`, rejecting overflow.
fn number(digits: &str) -> Option<u8> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl FromStr for Release {
    type Err = ParseReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_release(s)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Tip => f.write_str(TIP),
            Self::Tagged {
                minor,
                patch,
                stage,
            } => {
                write!(f, "{PREFIX}{minor}")?;
                if patch > 0 {
                    write!(f, ".{patch}")?;
                }
                match stage {
                    Stage::Final => Ok(()),
                    Stage::Candidate(n) => write!(f, "rc{n}"),
                    Stage::Beta(n) => write!(f, "beta{n}"),
                }
            }
        }
    }
}

impl Ord for Release {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_tip(), other.is_tip()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .minor()
                .cmp(&other.minor())
                .then(self.patch().cmp(&other.patch()))
                .then(
                    self.prerelease_kind()
                        .rank()
                        .cmp(&other.prerelease_kind().rank()),
                )
                .then(self.prerelease_number().cmp(&other.prerelease_number())),
        }
    }
}

impl PartialOrd for Release {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Release {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Release {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// An ordered collection of releases, rebuilt for every query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseSet(Vec<Release>);

impl ReleaseSet {
    /// Returns the greatest release, or `None` for an empty set.
    #[must_use]
    pub fn latest(&self) -> Option<Release> {
        self.0.iter().max().copied()
    }

    /// Sorts the set newest first.
    #[must_use]
    pub fn descending(mut self) -> Self {
        self.0.sort_unstable_by(|a, b| b.cmp(a));
        self
    }

    /// Keeps only tagged releases whose minor version equals `minor`.
    #[must_use]
    pub fn with_minor(mut self, minor: u8) -> Self {
        self.0.retain(|r| !r.is_tip() && r.minor() == minor);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Release> {
        self.0.iter()
    }
}

impl FromIterator<Release> for ReleaseSet {
    fn from_iter<T: IntoIterator<Item = Release>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ReleaseSet {
    type Item = Release;
    type IntoIter = std::vec::IntoIter<Release>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
