use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::repo::retry::RetryPolicy;

// =============================================================================
// Release window defaults
// =============================================================================

/// First release that shipped the deprecated runtime
pub const DEFAULT_FIRST_RELEASE: u32 = 14;

/// Current development release
pub const DEFAULT_CURRENT_RELEASE: u32 = 32;

// =============================================================================
// Query retry defaults
// =============================================================================

/// Maximum number of retries for a failed repository query
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay before the first retry in milliseconds
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 500;

/// Upper bound for the retry delay in milliseconds
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

/// External EVR comparator
pub const DEFAULT_VERCMP_PROGRAM: &str = "rpmdev-vercmp";

const APP_NAME: &str = "obsoletes-audit";

/// Top-level configuration, usually read from a JSON file
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    pub releases: ReleaseWindowConfig,
    pub repository: RepositoryConfig,
    pub retry: RetryConfig,
    pub report: ReportConfig,
    pub coverage: CoverageConfig,
    pub vercmp_program: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            releases: ReleaseWindowConfig::default(),
            repository: RepositoryConfig::default(),
            retry: RetryConfig::default(),
            report: ReportConfig::default(),
            coverage: CoverageConfig::default(),
            vercmp_program: DEFAULT_VERCMP_PROGRAM.to_string(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a JSON file, using defaults for missing fields
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Releases covered by the audit
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseWindowConfig {
    pub first: u32,
    pub current: u32,
}

impl Default for ReleaseWindowConfig {
    fn default() -> Self {
        Self {
            first: DEFAULT_FIRST_RELEASE,
            current: DEFAULT_CURRENT_RELEASE,
        }
    }
}

/// Settings passed through to `dnf repoquery`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoryConfig {
    pub program: String,
    pub arch: String,
    /// Repositories queried for a numbered release
    pub release_repos: Vec<String>,
    /// Repositories queried for the current development snapshot
    pub current_repos: Vec<String>,
    pub exclude: Vec<String>,
    /// dnf metadata cache, defaults to [`cache_dir`]
    pub cache_dir: Option<PathBuf>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            program: "dnf".to_string(),
            arch: "x86_64".to_string(),
            release_repos: vec![
                "fedora".to_string(),
                "updates".to_string(),
                "updates-testing".to_string(),
            ],
            current_repos: vec!["rawhide".to_string()],
            // Broken modular metadata in these packages confuses the depsolver
            exclude: [
                "fedora-release",
                "fedora-release-cinnamon",
                "fedora-release-cloud",
                "fedora-release-container",
                "fedora-release-coreos",
                "fedora-release-iot",
                "fedora-release-kde",
                "fedora-release-matecompiz",
                "fedora-release-server",
                "fedora-release-silverblue",
                "fedora-release-snappy",
                "fedora-release-soas",
                "fedora-release-workstation",
                "fedora-release-xfce",
                "generic-release",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            cache_dir: None,
        }
    }
}

/// Bounded retry with exponential backoff for repository queries
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            backoff_factor: 2,
        }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        RetryPolicy {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_factor: config.backoff_factor,
        }
    }
}

/// What counts as "still depends on the deprecated runtime" and who owns catch-all obsoletes
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CoverageConfig {
    /// Dependency markers of the deprecated runtime
    pub tracked_dependencies: Vec<String>,
    /// Requirements that do not count as a real dependency; empty means `trackedDependencies`
    pub trivial_requires: Vec<String>,
    pub dist_tag_marker: String,
    pub catch_all_package: String,
    /// Emit `%obsolete` lines for packages the catch-all package already obsoletes
    pub reemit_catch_all: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            tracked_dependencies: vec![
                "python(abi) = 2.7".to_string(),
                "libpython2.7.so.1.0()(64bit)".to_string(),
                "libpython2.7_d.so.1.0()(64bit)".to_string(),
            ],
            trivial_requires: Vec::new(),
            dist_tag_marker: "fc".to_string(),
            catch_all_package: "fedora-obsolete-packages".to_string(),
            reemit_catch_all: true,
        }
    }
}

/// Wording of the report banners
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportConfig {
    pub runtime_label: String,
    pub distro_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            runtime_label: "Python 2".to_string(),
            distro_name: "Fedora".to_string(),
        }
    }
}

/// Returns the cache directory for obsoletes-audit.
/// Uses $XDG_CACHE_HOME/obsoletes-audit if XDG_CACHE_HOME is set,
/// otherwise falls back to ~/.cache/obsoletes-audit,
/// or ./obsoletes-audit if neither is available.
pub fn cache_dir() -> PathBuf {
    cache_dir_with_env(std::env::var("XDG_CACHE_HOME").ok(), dirs::home_dir())
}

/// Returns the path of the dnf metadata cache.
pub fn dnf_cache_dir() -> PathBuf {
    cache_dir().join("dnf")
}

/// Returns the default path of the JSON log file.
pub fn log_path() -> PathBuf {
    cache_dir().join("obsoletes-audit.log")
}

fn cache_dir_with_env(xdg_cache_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let cache_dir = xdg_cache_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".cache")))
        .unwrap_or_else(|| PathBuf::from("."));

    cache_dir.join(APP_NAME)
}
