//! Activate command for chgo.
//!
//! Makes a Go release the one `~/bin/go` runs, installing and downloading it
//! first when needed.
//!
//! ## Usage
//!
//! ```bash
//! chgo 1.21.3     # a specific release
//! chgo go1.22rc1  # the `go` prefix is optional
//! chgo latest     # the newest stable release
//! chgo tip        # the development tip
//! ```

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::toolchain::{Activation, Activator, GoCommand, OsFilesystem, StableFeed};

/// Executes the activate command.
///
/// # Errors
///
/// Returns an error if resolving, installing, downloading or linking the
/// release fails, or if `cancel` fires first.
pub async fn execute(version: &str, config: &Config, cancel: &CancellationToken) -> Result<()> {
    let go = GoCommand::new(config.go.clone(), config.paths.gobin.clone());
    let activator = Activator::new(
        config.paths.clone(),
        StableFeed::new(&config.dist_server)?,
        go.clone(),
        go,
        OsFilesystem,
    );

    if let Some(activation) = activator.activate(cancel, version).await? {
        report(&activation, config);
    }

    Ok(())
}

fn report(activation: &Activation, config: &Config) {
    let release = activation.release;
    if activation.installed || activation.fetched {
        info!("{release} installed");
    }
    info!("{} now runs {release}", config.paths.current.display());
}
