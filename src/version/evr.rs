//! Pure transforms over epoch:version-release strings

use std::sync::LazyLock;

use regex::Regex;

use crate::version::error::UnbumpableVersion;

/// A release segment with a leading number followed by anything else (e.g. `2what`)
static NUMERIC_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+).+").expect("numeric prefix pattern is valid"));

/// Remove every release segment that starts with the dist tag marker
///
/// `1.0-3.fc20` with marker `fc` becomes `1.0-3`. Strings without a
/// release field are returned unchanged.
pub fn strip_dist_tag(evr: &str, marker: &str) -> String {
    let Some((ev, release)) = evr.rsplit_once('-') else {
        return evr.to_string();
    };

    let release: Vec<&str> = release
        .split('.')
        .filter(|part| !part.starts_with(marker))
        .collect();

    format!("{}-{}", ev, release.join("."))
}

/// Drop a zero epoch (`0:1.2-3` -> `1.2-3`)
pub fn normalize_epoch(evr: &str) -> String {
    match evr.split_once(':') {
        Some(("0", version_release)) => version_release.to_string(),
        _ => evr.to_string(),
    }
}

/// Compute the next representable release for `evr`
///
/// Scans the release segments left to right:
/// - `0` segments that are not last are kept
/// - the first integer segment is incremented and everything after it dropped
/// - non-integer segments that are not last are kept
/// - a last segment like `2what` becomes `3`
pub fn bump_release(evr: &str) -> Result<String, UnbumpableVersion> {
    let Some((ev, release)) = evr.rsplit_once('-') else {
        return Err(UnbumpableVersion::new(evr, "no release field"));
    };

    let parts: Vec<&str> = release.split('.').collect();
    let last = parts.len() - 1;
    let mut bumped: Vec<String> = Vec::with_capacity(parts.len());

    for (i, part) in parts.iter().enumerate() {
        if *part == "0" && i != last {
            bumped.push(part.to_string());
            continue;
        }

        if let Ok(number) = part.parse::<u64>() {
            bumped.push(increment(evr, number)?);
            return Ok(format!("{}-{}", ev, bumped.join(".")));
        }

        if i != last {
            bumped.push(part.to_string());
            continue;
        }

        let prefix = NUMERIC_PREFIX
            .captures(part)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .ok_or_else(|| UnbumpableVersion::new(evr, "no numeric release segment"))?;
        bumped.push(increment(evr, prefix)?);
        return Ok(format!("{}-{}", ev, bumped.join(".")));
    }

    Err(UnbumpableVersion::new(evr, "empty release"))
}

fn increment(evr: &str, number: u64) -> Result<String, UnbumpableVersion> {
    number
        .checked_add(1)
        .map(|n| n.to_string())
        .ok_or_else(|| UnbumpableVersion::new(evr, "release number overflow"))
}
