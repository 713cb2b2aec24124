//! One audit run, from repository queries to the rendered report

use tracing::info;

use crate::analysis::gap::{CoveragePolicy, Findings, GapAnalyzer};
use crate::analysis::history::{collect_window, reduce_to_last_known};
use crate::analysis::report::ReportEmitter;
use crate::config::{AuditConfig, dnf_cache_dir};
use crate::error::AuditError;
use crate::repo::cache::QueryCache;
use crate::repo::dnf::DnfRepoQuery;
use crate::repo::query::RepoQuery;
use crate::repo::types::{ReleaseWindow, Snapshot};
use crate::version::order::{RpmdevVercmp, VersionOrder};

/// Compute the findings for every package removed within the configured window
///
/// Query failures while building the history are fatal; failures while
/// scanning one package only skip that package.
pub async fn audit<Q, O>(
    cache: &QueryCache<Q>,
    order: &O,
    config: &AuditConfig,
) -> Result<Findings, AuditError>
where
    Q: RepoQuery,
    O: VersionOrder + ?Sized,
{
    let window = ReleaseWindow::new(config.releases.first, config.releases.current);
    if window.is_empty() {
        return Err(AuditError::EmptyWindow {
            first: window.first,
            current: window.current,
        });
    }

    info!(
        "Collecting packages requiring {:?} in releases {}..={}",
        config.coverage.tracked_dependencies, window.first, window.current
    );
    let snapshots = collect_window(cache, window, &config.coverage.tracked_dependencies).await?;
    let current_names = cache.all_package_names(Snapshot::Current).await?;
    info!("{} packages in the current snapshot", current_names.len());

    let summary = reduce_to_last_known(&snapshots, &current_names, order);

    let policy = CoveragePolicy::from(&config.coverage);
    let analyzer = GapAnalyzer::new(cache, &policy, window.current);
    Ok(analyzer.analyze(&summary).await)
}

/// Run the audit against the live repositories and render the report
pub async fn run(config: &AuditConfig) -> Result<String, AuditError> {
    let cache_dir = config
        .repository
        .cache_dir
        .clone()
        .unwrap_or_else(dnf_cache_dir);
    info!("Using dnf cache directory {:?}", cache_dir);

    let repo = DnfRepoQuery::new(&config.repository, cache_dir, config.releases.current);
    let cache = QueryCache::new(repo, config.retry.into());
    let order = RpmdevVercmp::new(&config.vercmp_program);

    let findings = audit(&cache, &order, config).await?;
    Ok(ReportEmitter::new(&config.report).render(&findings))
}
