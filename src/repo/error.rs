use thiserror::Error;

use crate::repo::types::Snapshot;

#[derive(Debug, Clone, Error)]
pub enum QueryError {
    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} failed for {snapshot} (exit status {status:?}): {stderr}")]
    CommandFailed {
        program: String,
        snapshot: Snapshot,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Package not found in {snapshot}: {name}")]
    NotFound { name: String, snapshot: Snapshot },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Query cache lock poisoned")]
    LockPoisoned,
}

impl QueryError {
    /// Whether retrying the same query may succeed
    ///
    /// dnf exits non-zero on mirror and metadata download hiccups; every other
    /// failure is deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, QueryError::CommandFailed { .. })
    }
}
