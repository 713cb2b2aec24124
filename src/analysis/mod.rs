//! Obsoletion audit over the release history
//!
//! # Modules
//!
//! - [`history`]: Per-release snapshots and their reduction to last known releases
//! - [`gap`]: Per-package obsoletion gap scan
//! - [`report`]: Text rendering of the findings

pub mod gap;
pub mod history;
pub mod report;
