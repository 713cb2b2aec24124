//! Plain-text report rendering
//!
//! The output is meant to be appended to the spec file of the catch-all
//! obsoletion package: `%obsolete` lines are declarations, everything else is
//! a `#` comment.

use crate::analysis::gap::{Finding, Findings};
use crate::config::ReportConfig;
use crate::repo::types::ReleaseId;

pub struct ReportEmitter {
    runtime_label: String,
    distro_name: String,
}

impl ReportEmitter {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            runtime_label: config.runtime_label.clone(),
            distro_name: config.distro_name.clone(),
        }
    }

    /// Banner opening the section of packages last seen in `release`
    pub fn header(&self, release: ReleaseId) -> String {
        format!(
            "# {} packages removed in {} {} but never obsoleted",
            self.runtime_label,
            self.distro_name,
            release + 1
        )
    }

    /// Render one finding as a single line
    pub fn line(&self, finding: &Finding) -> String {
        match finding {
            Finding::ObsoleteNow { name, version } => format!("%obsolete {} {}", name, version),
            Finding::AlreadyCovered { name, version, by } => {
                format!("# {} {} already obsoleted by {}", name, version, by)
            }
            Finding::CoveredByOther {
                name,
                version,
                obsoleters,
            } => format!("# {} {} obsoleted by {}", name, version, obsoleters.join(", ")),
            Finding::StillTrivial { name } => {
                format!("# {} only requires {}", name, self.runtime_label)
            }
            Finding::DoubleCovered {
                name,
                first,
                second,
            } => format!(
                "# {} obsoleted in {} {} and {}",
                name, self.distro_name, first, second
            ),
            Finding::Unbumpable { name, error } => format!("# {} skipped: {}", name, error),
            Finding::Skipped { name, reason } => format!("# {} skipped: {}", name, reason),
        }
    }

    /// Render every release section in ascending release order
    pub fn render(&self, findings: &Findings) -> String {
        let mut out = String::new();
        for (&release, release_findings) in findings {
            out.push('\n');
            out.push_str(&self.header(release));
            out.push('\n');
            for finding in release_findings {
                out.push_str(&self.line(finding));
                out.push('\n');
            }
        }
        out
    }
}
