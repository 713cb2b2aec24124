//! EVR ordering abstraction
//!
//! RPM version comparison has too many corner cases (tilde pre-releases,
//! mixed alpha/numeric segments) to reimplement, so ordering is delegated to
//! an external comparator behind the [`VersionOrder`] trait.

use std::cmp::Ordering;
use std::process::{Command, Stdio};

#[cfg(test)]
use mockall::automock;
use tracing::{debug, warn};

use crate::config::DEFAULT_VERCMP_PROGRAM;
use crate::version::error::VersionCompareError;

/// Total order over epoch:version-release strings
#[cfg_attr(test, automock)]
pub trait VersionOrder: Send + Sync {
    /// Compare `left` to `right`
    ///
    /// Returns `Ordering::Greater` when `left` is the newer build.
    fn compare(&self, left: &str, right: &str) -> Result<Ordering, VersionCompareError>;
}

/// Comparator that shells out to `rpmdev-vercmp`
pub struct RpmdevVercmp {
    program: String,
}

impl RpmdevVercmp {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }
}

impl Default for RpmdevVercmp {
    fn default() -> Self {
        Self::new(DEFAULT_VERCMP_PROGRAM)
    }
}

impl VersionOrder for RpmdevVercmp {
    fn compare(&self, left: &str, right: &str) -> Result<Ordering, VersionCompareError> {
        if left == right {
            return Ok(Ordering::Equal);
        }

        let output = Command::new(&self.program)
            .arg(left)
            .arg(right)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| VersionCompareError::Spawn {
                program: self.program.clone(),
                message: e.to_string(),
            })?;

        let status = output.status.code();
        debug!("{} {} {} -> {:?}", self.program, left, right, status);

        ordering_from_exit_code(status).ok_or_else(|| {
            warn!(
                "{} failed for '{}' vs '{}': {}",
                self.program,
                left,
                right,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            VersionCompareError::Rejected {
                program: self.program.clone(),
                left: left.to_string(),
                right: right.to_string(),
                status,
            }
        })
    }
}

/// Map an `rpmdev-vercmp` exit status to an ordering
///
/// `0` means equal, `11` means the first argument is newer,
/// `12` means the second argument is newer.
fn ordering_from_exit_code(code: Option<i32>) -> Option<Ordering> {
    match code? {
        0 => Some(Ordering::Equal),
        11 => Some(Ordering::Greater),
        12 => Some(Ordering::Less),
        _ => None,
    }
}

/// Find the newest EVR in `versions`
///
/// Equal EVRs are interchangeable, so the first of several equal maxima wins.
/// Returns `Ok(None)` for an empty input.
pub fn max_evr<'a, O, I>(order: &O, versions: I) -> Result<Option<&'a str>, VersionCompareError>
where
    O: VersionOrder + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let mut max: Option<&'a str> = None;
    for candidate in versions {
        let newer = match max {
            Some(current) => order.compare(candidate, current)? == Ordering::Greater,
            None => true,
        };
        if newer {
            max = Some(candidate);
        }
    }
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(0), Some(Ordering::Equal))]
    #[case(Some(11), Some(Ordering::Greater))]
    #[case(Some(12), Some(Ordering::Less))]
    #[case(Some(1), None)]
    #[case(None, None)]
    fn ordering_from_exit_code_returns_expected(
        #[case] code: Option<i32>,
        #[case] expected: Option<Ordering>,
    ) {
        assert_eq!(ordering_from_exit_code(code), expected);
    }

    #[test]
    fn max_evr_returns_greatest_according_to_order() {
        let mut order = MockVersionOrder::new();
        order
            .expect_compare()
            .returning(|left, right| Ok(left.len().cmp(&right.len())));

        let result = max_evr(&order, ["1.0-1", "1.0-10", "1.0-2"]).unwrap();

        assert_eq!(result, Some("1.0-10"));
    }

    #[test]
    fn max_evr_returns_none_for_empty_input() {
        let order = MockVersionOrder::new();

        let result = max_evr(&order, std::iter::empty::<&str>()).unwrap();

        assert_eq!(result, None);
    }

    #[test]
    fn max_evr_propagates_comparator_failure() {
        let mut order = MockVersionOrder::new();
        order.expect_compare().returning(|left, right| {
            Err(VersionCompareError::Rejected {
                program: "rpmdev-vercmp".to_string(),
                left: left.to_string(),
                right: right.to_string(),
                status: Some(1),
            })
        });

        let result = max_evr(&order, ["1.0-1", "???"]);

        assert!(matches!(result, Err(VersionCompareError::Rejected { .. })));
    }

    #[test]
    fn rpmdev_vercmp_short_circuits_identical_strings() {
        let order = RpmdevVercmp::new("/nonexistent/rpmdev-vercmp");

        assert_eq!(order.compare("1:2.0-1", "1:2.0-1"), Ok(Ordering::Equal));
    }

    #[test]
    fn rpmdev_vercmp_reports_missing_program() {
        let order = RpmdevVercmp::new("/nonexistent/rpmdev-vercmp");

        let result = order.compare("1.0-1", "2.0-1");

        assert!(matches!(result, Err(VersionCompareError::Spawn { .. })));
    }
}
