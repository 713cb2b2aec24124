//! Common types for repository queries

use std::fmt;

/// Distribution release number (e.g. 30 for Fedora 30)
pub type ReleaseId = u32;

/// Repository snapshot a query runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Snapshot {
    /// Stable or branched repositories of a numbered release
    Release(ReleaseId),
    /// Live development snapshot
    Current,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Snapshot::Release(release) => write!(f, "release {}", release),
            Snapshot::Current => f.write_str("current"),
        }
    }
}

/// A package name with the EVR it was built as
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageRecord {
    pub name: String,
    pub evr: String,
}

impl PackageRecord {
    pub fn new(name: &str, evr: &str) -> Self {
        Self {
            name: name.to_string(),
            evr: evr.to_string(),
        }
    }
}

/// Inclusive range of releases from the first tracked release to the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindow {
    pub first: ReleaseId,
    pub current: ReleaseId,
}

impl ReleaseWindow {
    pub fn new(first: ReleaseId, current: ReleaseId) -> Self {
        Self { first, current }
    }

    /// Every release in the window, ascending
    pub fn releases(&self) -> impl Iterator<Item = ReleaseId> {
        self.first..=self.current
    }

    pub fn is_empty(&self) -> bool {
        self.first > self.current
    }
}
