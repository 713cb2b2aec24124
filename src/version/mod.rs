//! Version handling for RPM epoch:version-release strings
//!
//! # Modules
//!
//! - [`order`]: Pluggable EVR ordering, backed by `rpmdev-vercmp`
//! - [`evr`]: Pure string transforms (dist tag stripping, epoch normalization, release bumping)
//! - [`error`]: Error types for comparison and bumping

pub mod error;
pub mod evr;
pub mod order;
