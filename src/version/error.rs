use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VersionCompareError {
    #[error("Failed to run {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} rejected '{left}' vs '{right}' (exit status {status:?})")]
    Rejected {
        program: String,
        left: String,
        right: String,
        status: Option<i32>,
    },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Cannot bump release of {evr}: {reason}")]
pub struct UnbumpableVersion {
    pub evr: String,
    pub reason: &'static str,
}

impl UnbumpableVersion {
    pub(crate) fn new(evr: &str, reason: &'static str) -> Self {
        Self {
            evr: evr.to_string(),
            reason,
        }
    }
}
