//! Repository query layer
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Analysis   │────▶│ QueryCache  │────▶│  RepoQuery  │
//! │ (history,   │     │ (memo +     │     │ (dnf        │
//! │  gap scan)  │     │  retry)     │     │  repoquery) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`query`]: The `RepoQuery` trait every repository backend implements
//! - [`dnf`]: `dnf repoquery` subprocess backend
//! - [`cache`]: Per-run memo with at-most-once population per key
//! - [`retry`]: Bounded exponential backoff for transient failures
//! - [`types`]: Release identifiers and package records
//! - [`error`]: Query error type

pub mod cache;
pub mod dnf;
pub mod error;
pub mod query;
pub mod retry;
pub mod types;
