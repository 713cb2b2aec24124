//! `dnf repoquery` backend

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::RepositoryConfig;
use crate::repo::error::QueryError;
use crate::repo::query::RepoQuery;
use crate::repo::types::{PackageRecord, ReleaseId, Snapshot};

/// Queries Fedora-style repositories by running `dnf repoquery`
///
/// Numbered releases use the stable repositories with `--releasever` set to
/// the release; the current snapshot uses the development repositories.
pub struct DnfRepoQuery {
    program: String,
    arch: String,
    release_repos: Vec<String>,
    current_repos: Vec<String>,
    exclude: Vec<String>,
    cache_dir: PathBuf,
    current_release: ReleaseId,
}

impl DnfRepoQuery {
    pub fn new(config: &RepositoryConfig, cache_dir: PathBuf, current_release: ReleaseId) -> Self {
        Self {
            program: config.program.clone(),
            arch: config.arch.clone(),
            release_repos: config.release_repos.clone(),
            current_repos: config.current_repos.clone(),
            exclude: config.exclude.clone(),
            cache_dir,
            current_release,
        }
    }

    /// Arguments shared by every query against `snapshot`
    fn base_args(&self, snapshot: Snapshot) -> Vec<String> {
        let (repos, releasever) = match snapshot {
            Snapshot::Release(release) => (&self.release_repos, release),
            Snapshot::Current => (&self.current_repos, self.current_release),
        };

        let mut args = vec![
            "repoquery".to_string(),
            "--quiet".to_string(),
            "--disablerepo=*".to_string(),
            format!("--enablerepo={}", repos.join(",")),
            format!("--releasever={}", releasever),
            format!("--forcearch={}", self.arch),
            format!("--setopt=cachedir={}", self.cache_dir.display()),
        ];
        if !self.exclude.is_empty() {
            args.push(format!("--exclude={}", self.exclude.join(",")));
        }
        args
    }

    /// Run a repoquery and return its non-empty output lines
    async fn run(&self, snapshot: Snapshot, extra: &[&str]) -> Result<Vec<String>, QueryError> {
        let mut args = self.base_args(snapshot);
        args.extend(extra.iter().map(|s| s.to_string()));
        debug!("Running {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| QueryError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(
                "{} exited with {:?} for {}: {}",
                self.program,
                output.status.code(),
                snapshot,
                stderr
            );
            return Err(QueryError::CommandFailed {
                program: self.program.clone(),
                snapshot,
                status: output.status.code(),
                stderr,
            });
        }

        Ok(parse_lines(&String::from_utf8_lossy(&output.stdout)))
    }
}

#[async_trait::async_trait]
impl RepoQuery for DnfRepoQuery {
    async fn what_requires(
        &self,
        dependency: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<PackageRecord>, QueryError> {
        let lines = self
            .run(
                snapshot,
                &["--whatrequires", dependency, "--queryformat", "%{name} %{evr}"],
            )
            .await?;
        parse_records(&lines)
    }

    async fn requires(
        &self,
        package: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<String>, QueryError> {
        // An unmatched package and one without requirements both print nothing
        let found = self
            .run(
                snapshot,
                &["--latest-limit", "1", "--queryformat", "%{name}", package],
            )
            .await?;
        if found.is_empty() {
            return Err(QueryError::NotFound {
                name: package.to_string(),
                snapshot,
            });
        }

        self.run(snapshot, &["--requires", "--latest-limit", "1", package])
            .await
    }

    async fn what_obsoletes(
        &self,
        spec: &str,
        snapshot: Snapshot,
    ) -> Result<Vec<String>, QueryError> {
        let lines = self
            .run(snapshot, &["--whatobsoletes", spec, "--queryformat", "%{name}"])
            .await?;
        Ok(lines
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect())
    }

    async fn all_package_names(&self, snapshot: Snapshot) -> Result<BTreeSet<String>, QueryError> {
        let lines = self.run(snapshot, &["--queryformat", "%{name}"]).await?;
        Ok(lines.into_iter().collect())
    }
}

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_records(lines: &[String]) -> Result<Vec<PackageRecord>, QueryError> {
    lines
        .iter()
        .map(|line| {
            line.split_once(' ')
                .map(|(name, evr)| PackageRecord::new(name, evr.trim()))
                .ok_or_else(|| {
                    QueryError::InvalidResponse(format!("expected '<name> <evr>', got '{}'", line))
                })
        })
        .collect()
}
