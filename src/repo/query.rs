//! Repository query trait

use std::collections::BTreeSet;

#[cfg(test)]
use mockall::automock;

use crate::repo::error::QueryError;
use crate::repo::types::{PackageRecord, Snapshot};

/// Read-only queries against a package repository snapshot
///
/// Implementations must be idempotent: the same query against the same
/// snapshot returns the same answer for the duration of a run.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RepoQuery: Send + Sync {
    /// Packages whose requirements include `dependency`
    async fn what_requires(
        &self,
        dependency: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<PackageRecord>, QueryError>;

    /// Requirements of the latest build of `package`
    async fn requires(&self, package: &str, snapshot: Snapshot)
    -> Result<Vec<String>, QueryError>;

    /// Names of packages declaring an obsoletes-relation matching `spec` (e.g. `foo = 1.0-1`)
    async fn what_obsoletes(
        &self,
        spec: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<String>, QueryError>;

    /// Every package name in the snapshot
    async fn all_package_names(&self, snapshot: Snapshot) -> Result<BTreeSet<String>, QueryError>;
}
