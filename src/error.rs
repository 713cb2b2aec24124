use thiserror::Error;

use crate::repo::error::QueryError;
use crate::repo::types::ReleaseId;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Empty release window: first release {first} is after current release {current}")]
    EmptyWindow { first: ReleaseId, current: ReleaseId },

    #[error("Repository query failed: {0}")]
    Query(#[from] QueryError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}
