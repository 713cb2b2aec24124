//! Per-run memo over a [`RepoQuery`] backend
//!
//! The gap scan asks the same (snapshot, query, argument) questions many
//! times. Each key owns a [`OnceCell`], so concurrent callers for the same key
//! wait for a single upstream query instead of racing. Failed queries are
//! not memoized.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::repo::error::QueryError;
use crate::repo::query::RepoQuery;
use crate::repo::retry::RetryPolicy;
use crate::repo::types::{PackageRecord, Snapshot};

type MemoKey = (Snapshot, String);
type Memo<T> = Mutex<HashMap<MemoKey, Arc<OnceCell<T>>>>;

pub struct QueryCache<Q> {
    inner: Q,
    retry: RetryPolicy,
    what_requires: Memo<Vec<PackageRecord>>,
    requires: Memo<Vec<String>>,
    what_obsoletes: Memo<Vec<String>>,
    all_package_names: Memo<BTreeSet<String>>,
}

impl<Q: RepoQuery> QueryCache<Q> {
    pub fn new(inner: Q, retry: RetryPolicy) -> Self {
        Self {
            inner,
            retry,
            what_requires: Mutex::default(),
            requires: Mutex::default(),
            what_obsoletes: Mutex::default(),
            all_package_names: Mutex::default(),
        }
    }

    pub fn inner(&self) -> &Q {
        &self.inner
    }

    pub async fn what_requires(
        &self,
        dependency: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<PackageRecord>, QueryError> {
        let what = format!("whatrequires '{}' in {}", dependency, snapshot);
        memoized(&self.what_requires, (snapshot, dependency.to_string()), || {
            self.retry
                .run(&what, || self.inner.what_requires(dependency, snapshot))
        })
        .await
    }

    pub async fn requires(
        &self,
        package: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<String>, QueryError> {
        let what = format!("requires of {} in {}", package, snapshot);
        memoized(&self.requires, (snapshot, package.to_string()), || {
            self.retry
                .run(&what, || self.inner.requires(package, snapshot))
        })
        .await
    }

    pub async fn what_obsoletes(
        &self,
        spec: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<String>, QueryError> {
        let what = format!("whatobsoletes '{}' in {}", spec, snapshot);
        memoized(&self.what_obsoletes, (snapshot, spec.to_string()), || {
            self.retry
                .run(&what, || self.inner.what_obsoletes(spec, snapshot))
        })
        .await
    }

    pub async fn all_package_names(
        &self,
        snapshot: Snapshot,
    ) -> Result<BTreeSet<String>, QueryError> {
        let what = format!("all package names in {}", snapshot);
        memoized(&self.all_package_names, (snapshot, String::new()), || {
            self.retry
                .run(&what, || self.inner.all_package_names(snapshot))
        })
        .await
    }
}

async fn memoized<T, F, Fut>(memo: &Memo<T>, key: MemoKey, fetch: F) -> Result<T, QueryError>
where
    T: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, QueryError>>,
{
    let cell = {
        let mut entries = memo.lock().map_err(|_| QueryError::LockPoisoned)?;
        if entries.contains_key(&key) {
            debug!("Query cache hit for {:?}", key);
        }
        entries.entry(key).or_default().clone()
    };

    cell.get_or_try_init(fetch).await.cloned()
}
