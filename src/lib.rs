//! Audit of missing Obsoletes declarations for packages dropped from a distribution
//!
//! Walks the release history of every package that depended on a deprecated
//! runtime, finds the ones that disappeared from the development snapshot,
//! and reports which of them still need an `%obsolete` declaration.

pub mod analysis;
pub mod audit;
pub mod config;
pub mod error;
pub mod repo;
pub mod version;
