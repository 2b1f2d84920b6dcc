#![warn(clippy::pedantic)]

//! # chgo
//!
//! Installs Go releases through the `golang.org/dl` wrappers and switches
//! `~/bin/go` between them.
//!
//! ## Usage
//!
//! Activate a release, installing and downloading it if needed:
//! ```bash
//! chgo 1.21.3
//! chgo latest
//! ```
//!
//! List published releases, optionally only those of one minor version:
//! ```bash
//! chgo --list
//! chgo --list 1.21
//! chgo --list latest
//! ```

mod commands;
mod config;
mod errors;
mod logging;
mod release;
mod toolchain;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use commands::{activate, list};
use config::Config;
use errors::ChgoError;

/// Exit code reported when the operation was interrupted.
const EXIT_CANCELLED: i32 = 130;

/// Go toolchain switcher.
#[derive(Parser)]
#[command(
    name = "chgo",
    author,
    version,
    about = "Install and switch between Go toolchain releases",
    after_help = "\
VERSIONS:
    Releases are written like go1.21.3, go1.22rc1 or go1.21beta2. The go prefix
    may be omitted. 'latest' names the newest stable release, 'tip' the
    development version.

ENVIRONMENT VARIABLES:
    GOBIN                   Directory wrappers are installed into
    GOPATH                  First entry + /bin is used when GOBIN is unset
    CHGO_GO                 go binary used for installs (default: go in PATH)
    CHGO_DIST_SERVER        Download feed server (default: https://go.dev)
    CHGO_TREE_URL           golang/dl git tree API URL
    CHGO_LOG_JSON           Emit logs as JSON
    RUST_LOG                Log filter (default: chgo=info)"
)]
pub struct Cli {
    /// Release to activate, or the filter when listing.
    #[arg(value_name = "VERSION")]
    pub release: Option<String>,

    /// List published releases instead of activating one.
    #[clap(short = 'l', long = "list", action = clap::ArgAction::SetTrue)]
    pub list: bool,

    /// Show debug output.
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::SetTrue)]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    if let Err(e) = run(cli, &cancel).await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Prints an error and returns the appropriate exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("{}", error_message(e));
    match e.downcast_ref::<ChgoError>() {
        Some(err) if err.is_cancelled() => EXIT_CANCELLED,
        _ => 1,
    }
}

/// Renders `e` with its cause chain, naming the activation phase it stopped in.
fn error_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<ChgoError>().and_then(ChgoError::phase) {
        Some(phase) => format!("Error while {phase}: {e:?}"),
        None => format!("Error: {e:?}"),
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let config = Config::from_env()?;
    tracing::debug!(?config, "resolved configuration");

    if cli.list {
        list::execute(cli.release.as_deref(), &config, cancel).await
    } else {
        activate::execute(cli.release.as_deref().unwrap_or_default(), &config, cancel).await
    }
}
