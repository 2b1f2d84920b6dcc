//! List command for chgo.
//!
//! Prints published Go releases, newest first, one per line.
//!
//! ## Usage
//!
//! ```bash
//! chgo --list           # every release with a wrapper in golang/dl
//! chgo --list 1.21      # only go1.21 releases, including prereleases
//! chgo --list latest    # the newest stable release
//! ```
//!
//! ## Output Format
//!
//! ```text
//! go1.21.3
//! go1.21.2
//! go1.21rc2
//! go1.21
//! ```

use anyhow::Result;
use std::io::{self, Write};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::ChgoError;
use crate::release::{self, Release, ReleaseSet};
use crate::toolchain::activate::LATEST;
use crate::toolchain::listing::{ListedRelease, ReleaseLister, stable_releases};
use crate::toolchain::{DownloadTree, StableFeed};

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the filter is not a valid release, the listing
/// cannot be fetched, or stdout cannot be written.
pub async fn execute(
    filter: Option<&str>,
    config: &Config,
    cancel: &CancellationToken,
) -> Result<()> {
    let releases = if is_latest(filter) {
        let feed = StableFeed::new(&config.dist_server)?;
        newest_stable(&feed.list(cancel).await?)?
    } else {
        let minor = parse_filter(filter)?;
        let tree = DownloadTree::new(&config.tree_url)?;
        select(&tree.list(cancel).await?, minor)
    };

    debug!(count = releases.len(), "releases selected");
    if releases.is_empty() {
        info!("no releases matched");
    }

    write_releases(&mut io::stdout().lock(), &releases)?;
    Ok(())
}

/// Writes one canonical release name per line.
fn write_releases(out: &mut impl Write, releases: &ReleaseSet) -> io::Result<()> {
    releases
        .iter()
        .try_for_each(|release| writeln!(out, "{release}"))
}

fn is_latest(filter: Option<&str>) -> bool {
    filter.map(str::trim) == Some(LATEST)
}

/// Turns the filter argument into the minor version to keep.
///
/// Returns `None` when every release should be listed: no filter, an empty
/// one, or one naming the tip.
fn parse_filter(filter: Option<&str>) -> Result<Option<u8>, ChgoError> {
    let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(None);
    };

    let input = release::normalize(filter);
    let parsed: Release = match input.parse() {
        Ok(parsed) => parsed,
        Err(source) => {
            return Err(ChgoError::InvalidVersion {
                input: input.into_owned(),
                source,
            });
        }
    };

    Ok((!parsed.is_tip()).then(|| parsed.minor()))
}

/// Orders `listed` newest first, keeping only `minor` releases if given.
fn select(listed: &[ListedRelease], minor: Option<u8>) -> ReleaseSet {
    let all: ReleaseSet = listed.iter().map(|l| l.release).collect();
    match minor {
        Some(minor) => all.with_minor(minor).descending(),
        None => all.descending(),
    }
}

/// The newest stable release, as a set of one.
fn newest_stable(listed: &[ListedRelease]) -> Result<ReleaseSet, ChgoError> {
    let newest = stable_releases(listed)
        .latest()
        .ok_or(ChgoError::NoStableReleases)?;
    Ok(std::iter::once(newest).collect())
}
