//! Repository test utilities

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;

use obsoletes_audit::repo::error::QueryError;
use obsoletes_audit::repo::query::RepoQuery;
use obsoletes_audit::repo::types::{PackageRecord, ReleaseId, Snapshot};
use obsoletes_audit::version::error::VersionCompareError;
use obsoletes_audit::version::order::VersionOrder;

/// In-memory repository history
///
/// Unknown `requires` lookups fail with `NotFound`; every other unknown
/// query returns an empty answer.
#[derive(Default)]
pub struct FakeRepo {
    what_requires: HashMap<(String, Snapshot), Vec<PackageRecord>>,
    requires: HashMap<(String, Snapshot), Vec<String>>,
    what_obsoletes: HashMap<(String, Snapshot), Vec<String>>,
    current_names: BTreeSet<String>,
    fail_current: bool,
    obsoletes_queries: Mutex<Vec<(String, Snapshot)>>,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// `name` requires `dependency` in `release`
    pub fn with_package(
        mut self,
        release: ReleaseId,
        dependency: &str,
        name: &str,
        evr: &str,
    ) -> Self {
        self.what_requires
            .entry((dependency.to_string(), Snapshot::Release(release)))
            .or_default()
            .push(PackageRecord::new(name, evr));
        self
    }

    pub fn with_requires(mut self, name: &str, release: ReleaseId, requires: &[&str]) -> Self {
        self.requires.insert(
            (name.to_string(), Snapshot::Release(release)),
            requires.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_obsoletes(mut self, spec: &str, snapshot: Snapshot, obsoleters: &[&str]) -> Self {
        self.what_obsoletes.insert(
            (spec.to_string(), snapshot),
            obsoleters.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    pub fn with_current(mut self, names: &[&str]) -> Self {
        self.current_names = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn failing_current(mut self) -> Self {
        self.fail_current = true;
        self
    }

    /// Every `what_obsoletes` query seen so far, in call order
    pub fn obsoletes_queries(&self) -> Vec<(String, Snapshot)> {
        self.obsoletes_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepoQuery for FakeRepo {
    async fn what_requires(
        &self,
        dependency: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<PackageRecord>, QueryError> {
        Ok(self
            .what_requires
            .get(&(dependency.to_string(), snapshot))
            .cloned()
            .unwrap_or_default())
    }

    async fn requires(
        &self,
        package: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<String>, QueryError> {
        self.requires
            .get(&(package.to_string(), snapshot))
            .cloned()
            .ok_or_else(|| QueryError::NotFound {
                name: package.to_string(),
                snapshot,
            })
    }

    async fn what_obsoletes(
        &self,
        spec: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<String>, QueryError> {
        self.obsoletes_queries
            .lock()
            .unwrap()
            .push((spec.to_string(), snapshot));
        Ok(self
            .what_obsoletes
            .get(&(spec.to_string(), snapshot))
            .cloned()
            .unwrap_or_default())
    }

    async fn all_package_names(&self, snapshot: Snapshot) -> Result<BTreeSet<String>, QueryError> {
        if self.fail_current {
            return Err(QueryError::InvalidResponse(format!(
                "no metadata for {}",
                snapshot
            )));
        }
        Ok(self.current_names.clone())
    }
}

/// Orders EVRs as plain strings, good enough for single-digit test releases
pub struct LexicalOrder;

impl VersionOrder for LexicalOrder {
    fn compare(&self, left: &str, right: &str) -> Result<Ordering, VersionCompareError> {
        Ok(left.cmp(right))
    }
}
