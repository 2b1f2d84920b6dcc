//! Command modules for chgo.
//!
//! - [`activate`] - Switch `~/bin/go` to a release
//! - [`list`] - Print published releases

pub mod activate;
pub mod list;
