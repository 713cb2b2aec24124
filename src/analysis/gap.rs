//! Obsoletion gap analysis
//!
//! For every removed package, walks forward from its last known release and
//! checks that some package obsoletes it without redundant coverage, then
//! decides what (if anything) the current snapshot still needs.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::analysis::history::WindowSummary;
use crate::config::CoverageConfig;
use crate::repo::cache::QueryCache;
use crate::repo::error::QueryError;
use crate::repo::query::RepoQuery;
use crate::repo::types::{ReleaseId, Snapshot};
use crate::version::error::UnbumpableVersion;
use crate::version::evr::{bump_release, normalize_epoch, strip_dist_tag};

/// Outcome of the gap scan for one removed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    /// Nothing obsoletes the package yet; declare `name < version`
    ObsoleteNow { name: String, version: String },
    /// Only the catch-all package obsoletes it and re-emitting is disabled
    AlreadyCovered {
        name: String,
        version: String,
        by: String,
    },
    /// A specific package already obsoletes it in the current snapshot
    CoveredByOther {
        name: String,
        version: String,
        obsoleters: Vec<String>,
    },
    /// The package required nothing but the deprecated runtime
    StillTrivial { name: String },
    /// Obsoleted in two consecutive releases
    DoubleCovered {
        name: String,
        first: ReleaseId,
        second: ReleaseId,
    },
    /// Needs a declaration but the release field cannot be bumped
    Unbumpable {
        name: String,
        error: UnbumpableVersion,
    },
    /// The scan could not complete for this package
    Skipped { name: String, reason: String },
}

impl Finding {
    pub fn name(&self) -> &str {
        match self {
            Finding::ObsoleteNow { name, .. }
            | Finding::AlreadyCovered { name, .. }
            | Finding::CoveredByOther { name, .. }
            | Finding::StillTrivial { name }
            | Finding::DoubleCovered { name, .. }
            | Finding::Unbumpable { name, .. }
            | Finding::Skipped { name, .. } => name,
        }
    }
}

/// Findings grouped by last known release, ascending
pub type Findings = BTreeMap<ReleaseId, Vec<Finding>>;

/// Rules deciding what counts as trivial and who owns catch-all obsoletes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoveragePolicy {
    pub trivial_requires: BTreeSet<String>,
    pub dist_tag_marker: String,
    pub catch_all_package: String,
    pub reemit_catch_all: bool,
}

impl CoveragePolicy {
    /// A requirement that is empty or a deprecated runtime marker
    fn is_trivial(&self, requirement: &str) -> bool {
        requirement.is_empty() || self.trivial_requires.contains(requirement)
    }

    /// Version the obsoletes-relation has to match
    fn target_version(&self, max_version: &str) -> String {
        normalize_epoch(&strip_dist_tag(max_version, &self.dist_tag_marker))
    }
}

impl From<&CoverageConfig> for CoveragePolicy {
    fn from(config: &CoverageConfig) -> Self {
        let trivial = if config.trivial_requires.is_empty() {
            &config.tracked_dependencies
        } else {
            &config.trivial_requires
        };
        Self {
            trivial_requires: trivial.iter().cloned().collect(),
            dist_tag_marker: config.dist_tag_marker.clone(),
            catch_all_package: config.catch_all_package.clone(),
            reemit_catch_all: config.reemit_catch_all,
        }
    }
}

/// Per-package scan states
#[derive(Debug)]
enum ScanState {
    Unverified,
    RequirementCheck,
    CoverageScan {
        target: String,
        release: ReleaseId,
        covered_previous: bool,
    },
    CurrentCheck {
        target: String,
    },
    Resolved(Finding),
}

pub struct GapAnalyzer<'a, Q> {
    cache: &'a QueryCache<Q>,
    policy: &'a CoveragePolicy,
    current_release: ReleaseId,
}

impl<'a, Q: RepoQuery> GapAnalyzer<'a, Q> {
    pub fn new(
        cache: &'a QueryCache<Q>,
        policy: &'a CoveragePolicy,
        current_release: ReleaseId,
    ) -> Self {
        Self {
            cache,
            policy,
            current_release,
        }
    }

    /// Scan every removed package, releases ascending and names in lexicographic order
    pub async fn analyze(&self, summary: &WindowSummary) -> Findings {
        let mut findings = Findings::new();
        for (&release, names) in &summary.last_known {
            let mut release_findings = Vec::with_capacity(names.len());
            for name in names {
                release_findings.push(self.analyze_package(name, release, summary).await);
            }
            info!(
                "Analyzed {} packages last seen in release {}",
                release_findings.len(),
                release
            );
            findings.insert(release, release_findings);
        }
        findings
    }

    /// Scan a single package; query failures degrade to [`Finding::Skipped`]
    pub async fn analyze_package(
        &self,
        name: &str,
        last_known: ReleaseId,
        summary: &WindowSummary,
    ) -> Finding {
        self.scan(name, last_known, summary)
            .await
            .unwrap_or_else(|e| {
                warn!("Gap scan for {} aborted: {}", name, e);
                Finding::Skipped {
                    name: name.to_string(),
                    reason: format!("query failed: {}", e),
                }
            })
    }

    async fn scan(
        &self,
        name: &str,
        last_known: ReleaseId,
        summary: &WindowSummary,
    ) -> Result<Finding, QueryError> {
        let mut state = ScanState::Unverified;
        loop {
            debug!("{}: {:?}", name, state);
            state = match state {
                ScanState::Unverified => match summary.unorderable.get(name) {
                    Some(e) => ScanState::Resolved(Finding::Skipped {
                        name: name.to_string(),
                        reason: e.to_string(),
                    }),
                    None => ScanState::RequirementCheck,
                },
                ScanState::RequirementCheck => {
                    self.check_requirements(name, last_known, summary).await?
                }
                ScanState::CoverageScan {
                    target,
                    release,
                    covered_previous,
                } => {
                    if release >= self.current_release {
                        ScanState::CurrentCheck { target }
                    } else {
                        let spec = obsoletes_spec(name, &target);
                        let covered = !self
                            .cache
                            .what_obsoletes(&spec, Snapshot::Release(release))
                            .await?
                            .is_empty();
                        if covered && covered_previous {
                            ScanState::Resolved(Finding::DoubleCovered {
                                name: name.to_string(),
                                first: release - 1,
                                second: release,
                            })
                        } else {
                            ScanState::CoverageScan {
                                target,
                                release: release + 1,
                                covered_previous: covered,
                            }
                        }
                    }
                }
                ScanState::CurrentCheck { target } => {
                    ScanState::Resolved(self.check_current(name, target).await?)
                }
                ScanState::Resolved(finding) => return Ok(finding),
            };
        }
    }

    async fn check_requirements(
        &self,
        name: &str,
        last_known: ReleaseId,
        summary: &WindowSummary,
    ) -> Result<ScanState, QueryError> {
        let requires = self
            .cache
            .requires(name, Snapshot::Release(last_known))
            .await?;
        if requires.iter().all(|r| self.policy.is_trivial(r)) {
            return Ok(ScanState::Resolved(Finding::StillTrivial {
                name: name.to_string(),
            }));
        }

        Ok(match summary.max_versions.get(name) {
            Some(max_version) => ScanState::CoverageScan {
                target: self.policy.target_version(max_version),
                release: last_known,
                covered_previous: false,
            },
            None => ScanState::Resolved(Finding::Skipped {
                name: name.to_string(),
                reason: "no version recorded".to_string(),
            }),
        })
    }

    async fn check_current(&self, name: &str, target: String) -> Result<Finding, QueryError> {
        let obsoleters: Vec<String> = self
            .cache
            .what_obsoletes(&obsoletes_spec(name, &target), Snapshot::Current)
            .await?
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let catch_all_only = obsoleters
            .iter()
            .all(|p| *p == self.policy.catch_all_package);

        if obsoleters.is_empty() || (catch_all_only && self.policy.reemit_catch_all) {
            return Ok(match bump_release(&target) {
                Ok(version) => Finding::ObsoleteNow {
                    name: name.to_string(),
                    version,
                },
                Err(error) => Finding::Unbumpable {
                    name: name.to_string(),
                    error,
                },
            });
        }

        Ok(if catch_all_only {
            Finding::AlreadyCovered {
                name: name.to_string(),
                version: target,
                by: self.policy.catch_all_package.clone(),
            }
        } else {
            Finding::CoveredByOther {
                name: name.to_string(),
                version: target,
                obsoleters,
            }
        })
    }
}

fn obsoletes_spec(name: &str, version: &str) -> String {
    format!("{} = {}", name, version)
}
