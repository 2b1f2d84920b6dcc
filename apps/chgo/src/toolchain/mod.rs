//! Go toolchain management.
//!
//! ## Module Structure
//!
//! - [`activate`] - Resolve, install, download and switch to a release
//! - [`listing`] - Fetch the published release lists
//! - [`process`] - Run the `go` tooling as cancellable subprocesses
//! - [`fs`] - Filesystem operations behind a trait
//! - [`paths`] - Where wrappers, SDKs and the current link live

pub mod activate;
pub mod fs;
pub mod listing;
pub mod paths;
pub mod process;

pub use activate::{Activation, Activator};
pub use fs::OsFilesystem;
pub use listing::{DownloadTree, StableFeed};
pub use process::GoCommand;
