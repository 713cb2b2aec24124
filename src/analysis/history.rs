//! Release history of packages depending on the tracked runtime

use std::collections::{BTreeMap, BTreeSet};

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::repo::cache::QueryCache;
use crate::repo::error::QueryError;
use crate::repo::query::RepoQuery;
use crate::repo::types::{PackageRecord, ReleaseId, ReleaseWindow, Snapshot};
use crate::version::error::VersionCompareError;
use crate::version::order::{VersionOrder, max_evr};

/// Packages requiring any tracked dependency, per release
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotMap {
    releases: BTreeMap<ReleaseId, BTreeSet<PackageRecord>>,
}

impl SnapshotMap {
    pub fn new(releases: BTreeMap<ReleaseId, BTreeSet<PackageRecord>>) -> Self {
        Self { releases }
    }

    pub fn get(&self, release: ReleaseId) -> Option<&BTreeSet<PackageRecord>> {
        self.releases.get(&release)
    }

    /// Releases in ascending order with their records
    pub fn iter(&self) -> impl Iterator<Item = (ReleaseId, &BTreeSet<PackageRecord>)> {
        self.releases.iter().map(|(release, records)| (*release, records))
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

/// Where each removed package was last seen and its newest build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSummary {
    /// Release of final appearance -> names last seen there
    pub last_known: BTreeMap<ReleaseId, BTreeSet<String>>,
    /// Newest EVR observed for each removed package
    pub max_versions: BTreeMap<String, String>,
    /// Packages whose builds the comparator could not order
    pub unorderable: BTreeMap<String, VersionCompareError>,
}

impl WindowSummary {
    /// Total number of removed packages
    pub fn removed_count(&self) -> usize {
        self.last_known.values().map(BTreeSet::len).sum()
    }
}

/// Collect, for every release in `window`, the packages requiring any of `tracked`
///
/// Releases are queried concurrently; the map restores ascending order.
pub async fn collect_window<Q: RepoQuery>(
    cache: &QueryCache<Q>,
    window: ReleaseWindow,
    tracked: &[String],
) -> Result<SnapshotMap, QueryError> {
    let per_release = window.releases().map(|release| async move {
        let mut records = BTreeSet::new();
        for dependency in tracked {
            let found = cache
                .what_requires(dependency, Snapshot::Release(release))
                .await?;
            if !found.is_empty() {
                info!(
                    "{} packages require {} in release {}",
                    found.len(),
                    dependency,
                    release
                );
            }
            records.extend(found);
        }
        Ok::<_, QueryError>((release, records))
    });

    let releases = try_join_all(per_release).await?.into_iter().collect();
    Ok(SnapshotMap::new(releases))
}

/// Reduce the history to packages missing from `current_names`
///
/// Each removed name lands in the `last_known` set of the greatest release it
/// appeared in; its max version is taken over every appearance in the window.
pub fn reduce_to_last_known<O: VersionOrder + ?Sized>(
    snapshots: &SnapshotMap,
    current_names: &BTreeSet<String>,
    order: &O,
) -> WindowSummary {
    let mut last_seen: BTreeMap<&str, ReleaseId> = BTreeMap::new();
    let mut versions: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (release, records) in snapshots.iter() {
        for record in records {
            if current_names.contains(&record.name) {
                continue;
            }
            last_seen
                .entry(&record.name)
                .and_modify(|seen| *seen = (*seen).max(release))
                .or_insert(release);
            versions.entry(&record.name).or_default().insert(&record.evr);
        }
    }

    let mut summary = WindowSummary::default();
    for (name, release) in last_seen {
        summary
            .last_known
            .entry(release)
            .or_default()
            .insert(name.to_string());

        let evrs = versions.get(name).into_iter().flatten().copied();
        match max_evr(order, evrs) {
            Ok(Some(max)) => {
                summary.max_versions.insert(name.to_string(), max.to_string());
            }
            Ok(None) => debug!("No versions recorded for {}", name),
            Err(e) => {
                warn!("Cannot order builds of {}: {}", name, e);
                summary.unorderable.insert(name.to_string(), e);
            }
        }
    }

    info!(
        "{} removed packages across {} releases",
        summary.removed_count(),
        summary.last_known.len()
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::query::MockRepoQuery;
    use crate::repo::retry::RetryPolicy;
    use crate::version::order::MockVersionOrder;
    use std::cmp::Ordering;

    fn records(entries: &[(&str, &str)]) -> BTreeSet<PackageRecord> {
        entries
            .iter()
            .map(|(name, evr)| PackageRecord::new(name, evr))
            .collect()
    }

    fn lexical_order() -> MockVersionOrder {
        let mut order = MockVersionOrder::new();
        order
            .expect_compare()
            .returning(|left, right| Ok(left.cmp(right)));
        order
    }

    fn three_release_history() -> SnapshotMap {
        SnapshotMap::new(BTreeMap::from([
            (
                20,
                records(&[("alpha", "1.0-1.fc20"), ("beta", "2.0-1.fc20"), ("kept", "1-1")]),
            ),
            (21, records(&[("alpha", "1.0-2.fc21"), ("gamma", "3.0-1.fc21")])),
            (22, records(&[("alpha", "1.0-3.fc22"), ("kept", "1-2")])),
        ]))
    }

    #[test]
    fn reduce_assigns_each_removed_package_to_its_greatest_release() {
        let current = BTreeSet::from(["kept".to_string()]);

        let summary = reduce_to_last_known(&three_release_history(), &current, &lexical_order());

        assert_eq!(
            summary.last_known,
            BTreeMap::from([
                (20, BTreeSet::from(["beta".to_string()])),
                (21, BTreeSet::from(["gamma".to_string()])),
                (22, BTreeSet::from(["alpha".to_string()])),
            ])
        );
        assert_eq!(summary.removed_count(), 3);
    }

    #[test]
    fn reduce_excludes_packages_still_in_current_snapshot() {
        let current = BTreeSet::from(["kept".to_string()]);

        let summary = reduce_to_last_known(&three_release_history(), &current, &lexical_order());

        assert!(summary.last_known.values().all(|names| !names.contains("kept")));
        assert!(!summary.max_versions.contains_key("kept"));
    }

    #[test]
    fn reduce_takes_max_version_across_whole_window() {
        let history = SnapshotMap::new(BTreeMap::from([
            (20, records(&[("alpha", "1.0-9.fc20")])),
            (21, records(&[("alpha", "1.0-2.fc21")])),
        ]));

        let summary = reduce_to_last_known(&history, &BTreeSet::new(), &lexical_order());

        assert_eq!(summary.last_known[&21], BTreeSet::from(["alpha".to_string()]));
        assert_eq!(summary.max_versions["alpha"], "1.0-9.fc20");
    }

    #[test]
    fn reduce_records_unorderable_packages() {
        let history = SnapshotMap::new(BTreeMap::from([
            (20, records(&[("alpha", "1.0-1"), ("alpha", "bogus")])),
            (21, records(&[("beta", "1.0-1")])),
        ]));
        let mut order = MockVersionOrder::new();
        order.expect_compare().returning(|left, right| {
            if left == "bogus" || right == "bogus" {
                Err(VersionCompareError::Rejected {
                    program: "rpmdev-vercmp".to_string(),
                    left: left.to_string(),
                    right: right.to_string(),
                    status: Some(1),
                })
            } else {
                Ok(Ordering::Equal)
            }
        });

        let summary = reduce_to_last_known(&history, &BTreeSet::new(), &order);

        assert!(summary.unorderable.contains_key("alpha"));
        assert!(!summary.max_versions.contains_key("alpha"));
        assert_eq!(summary.max_versions["beta"], "1.0-1");
        assert_eq!(summary.last_known[&20], BTreeSet::from(["alpha".to_string()]));
    }

    #[tokio::test]
    async fn collect_window_unions_every_tracked_dependency() {
        let mut repo = MockRepoQuery::new();
        repo.expect_what_requires()
            .returning(|dependency, snapshot| match (dependency, snapshot) {
                ("python(abi) = 2.7", Snapshot::Release(20)) => {
                    Ok(vec![PackageRecord::new("foo", "1.0-1.fc20")])
                }
                ("libpython2.7.so.1.0()(64bit)", Snapshot::Release(20)) => Ok(vec![
                    PackageRecord::new("foo", "1.0-1.fc20"),
                    PackageRecord::new("bar", "2.0-1.fc20"),
                ]),
                ("python(abi) = 2.7", Snapshot::Release(21)) => {
                    Ok(vec![PackageRecord::new("bar", "2.0-2.fc21")])
                }
                _ => Ok(vec![]),
            });
        let cache = QueryCache::new(repo, RetryPolicy::none());
        let tracked = vec![
            "python(abi) = 2.7".to_string(),
            "libpython2.7.so.1.0()(64bit)".to_string(),
        ];

        let snapshots = collect_window(&cache, ReleaseWindow::new(20, 22), &tracked)
            .await
            .unwrap();

        assert_eq!(snapshots.len(), 3);
        assert_eq!(
            snapshots.get(20).unwrap(),
            &records(&[("bar", "2.0-1.fc20"), ("foo", "1.0-1.fc20")])
        );
        assert_eq!(snapshots.get(21).unwrap(), &records(&[("bar", "2.0-2.fc21")]));
        assert!(snapshots.get(22).unwrap().is_empty());
    }

    #[tokio::test]
    async fn collect_window_fails_when_a_release_query_fails() {
        let mut repo = MockRepoQuery::new();
        repo.expect_what_requires().returning(|_, snapshot| {
            if snapshot == Snapshot::Release(21) {
                Err(QueryError::InvalidResponse("garbage".to_string()))
            } else {
                Ok(vec![])
            }
        });
        let cache = QueryCache::new(repo, RetryPolicy::none());

        let result =
            collect_window(&cache, ReleaseWindow::new(20, 22), &["dep".to_string()]).await;

        assert!(matches!(result, Err(QueryError::InvalidResponse(_))));
    }
}
