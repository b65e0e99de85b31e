//! Affected-version range matching.
//!
//! Versions are compared as SemVer where possible. Maven-style versions that
//! SemVer rejects (`2.4`, `2.9.10.1`, `3.2.1.Final`) are compared numerically,
//! dot-segment by dot-segment. A range whose version or bounds have no numeric
//! core at all is compared as plain strings.

use std::cmp::Ordering;

use super::store::AffectedRange;

/// True when `version` falls into any of `ranges` (`introduced <= v < fixed`).
///
/// An empty range list means every version is affected, as does a range with no bounds.
pub fn is_affected(version: &str, ranges: &[AffectedRange]) -> bool {
    ranges.is_empty() || ranges.iter().any(|range| in_range(version, range))
}

fn in_range(version: &str, range: &AffectedRange) -> bool {
    let introduced = range.introduced.as_deref();
    let fixed = range.fixed.as_deref();

    let numeric = [Some(version), introduced, fixed]
        .into_iter()
        .flatten()
        .all(|v| numeric_core(v).is_some());
    let cmp = |a: &str, b: &str| {
        if numeric {
            compare_versions(a, b)
        } else {
            a.cmp(b)
        }
    };

    introduced.map_or(true, |lo| cmp(version, lo) != Ordering::Less)
        && fixed.map_or(true, |hi| cmp(version, hi) == Ordering::Less)
}

/// Order two versions that both have a numeric core.
fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Some(a), Some(b)) = (lenient_semver(a), lenient_semver(b)) {
        return a.cmp(&b);
    }
    match (numeric_core(a), numeric_core(b)) {
        (Some((na, qa)), Some((nb, qb))) => {
            compare_numbers(&na, &nb).then_with(|| compare_qualifiers(qa, qb))
        }
        _ => a.cmp(b),
    }
}

/// Component-wise comparison; the shorter side is padded with zeros.
fn compare_numbers(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Release qualifiers rank with the bare version; any other qualifier ranks before it.
fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    let a = release_normalized(a);
    let b = release_normalized(b);
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(&b),
    }
}

fn release_normalized(qualifier: &str) -> String {
    let q = qualifier.to_ascii_lowercase();
    match q.as_str() {
        "final" | "release" | "ga" => String::new(),
        _ => q,
    }
}

/// Split `2.9.10.1-beta` into `[2, 9, 10, 1]` and `"beta"`. `None` without leading digits.
fn numeric_core(raw: &str) -> Option<(Vec<u64>, &str)> {
    let raw = raw.trim().trim_start_matches('v');
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    let core = raw[..end].trim_end_matches('.');
    if core.is_empty() || core.starts_with('.') {
        return None;
    }
    let numbers = core
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let qualifier = raw[end..].trim_start_matches(['.', '-']);
    Some((numbers, qualifier))
}

/// Parse a version as SemVer, padding `1` / `1.2` to three components and
/// dropping a dotted qualifier such as `.Final` or `.RELEASE`.
pub fn lenient_semver(raw: &str) -> Option<semver::Version> {
    let raw = raw.trim().trim_start_matches('v');
    if let Ok(v) = semver::Version::parse(raw) {
        return Some(v);
    }

    let (core, pre) = match raw.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (raw, None),
    };

    let mut numbers: Vec<&str> = core
        .split('.')
        .take_while(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        .collect();
    if numbers.is_empty() || numbers.len() > 3 {
        return None;
    }
    while numbers.len() < 3 {
        numbers.push("0");
    }

    let mut candidate = numbers.join(".");
    if let Some(pre) = pre {
        candidate.push('-');
        candidate.push_str(pre);
    }
    semver::Version::parse(&candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(introduced: Option<&str>, fixed: Option<&str>) -> AffectedRange {
        AffectedRange {
            introduced: introduced.map(str::to_owned),
            fixed: fixed.map(str::to_owned),
        }
    }

    #[test]
    fn test_affected_in_range() {
        let ranges = vec![range(Some("3.0.0"), Some("3.2.2"))];
        assert!(is_affected("3.0.0", &ranges));
        assert!(is_affected("3.2.1", &ranges));
        assert!(!is_affected("3.2.2", &ranges));
        assert!(!is_affected("2.9.9", &ranges));
    }

    #[test]
    fn test_short_maven_versions() {
        let ranges = vec![range(Some("2.0"), Some("2.7"))];
        assert!(is_affected("2.4", &ranges));
        assert!(!is_affected("2.7", &ranges));
        assert!(is_affected("2.6.RELEASE", &ranges));
    }

    #[test]
    fn test_four_part_versions_compare_numerically() {
        assert!(is_affected("2.9.10.1", &[range(Some("2.9.0"), Some("2.10.0"))]));
        assert!(!is_affected("2.9.10.10", &[range(None, Some("2.9.10.8"))]));
        assert!(is_affected("2.9.10.7", &[range(None, Some("2.9.10.8"))]));
        assert!(!is_affected("2.9.10", &[range(Some("2.9.10.1"), None)]));
    }

    #[test]
    fn test_qualifiers_on_four_part_versions() {
        let ranges = vec![range(Some("2.9.10.1"), Some("2.9.10.4"))];
        assert!(is_affected("2.9.10.1.Final", &ranges));
        assert!(is_affected("2.9.10.4-rc1", &ranges));
        assert!(!is_affected("2.9.10.4.RELEASE", &ranges));
    }

    #[test]
    fn test_unbounded_range() {
        let ranges = vec![range(None, None)];
        assert!(is_affected("0.0.1", &ranges));
        assert!(is_affected("anything", &ranges));
    }

    #[test]
    fn test_empty_ranges_match_every_version() {
        assert!(is_affected("1.0.0", &[]));
        assert!(is_affected("r09", &[]));
    }

    #[test]
    fn test_string_fallback() {
        let ranges = vec![range(Some("abc"), Some("def"))];
        assert!(is_affected("bcd", &ranges));
        assert!(!is_affected("xyz", &ranges));
    }

    #[test]
    fn test_unparseable_bound_compares_whole_range_as_strings() {
        // "r09" has no numeric core, so "10.0" is compared as text: "10.0" < "r09".
        let ranges = vec![range(Some("r09"), None)];
        assert!(!is_affected("10.0", &ranges));
        assert!(is_affected("r10", &ranges));
    }

    #[test]
    fn test_lenient_semver() {
        assert_eq!(lenient_semver("1"), semver::Version::parse("1.0.0").ok());
        assert_eq!(lenient_semver("v1.2"), semver::Version::parse("1.2.0").ok());
        assert_eq!(
            lenient_semver("1.2-beta"),
            semver::Version::parse("1.2.0-beta").ok()
        );
        assert_eq!(lenient_semver("r09"), None);
        assert_eq!(lenient_semver("2.9.10.1"), None);
    }

    #[test]
    fn test_numeric_core() {
        assert_eq!(numeric_core("2.9.10.1"), Some((vec![2, 9, 10, 1], "")));
        assert_eq!(numeric_core("3.2.1.Final"), Some((vec![3, 2, 1], "Final")));
        assert_eq!(numeric_core("1.2-beta"), Some((vec![1, 2], "beta")));
        assert_eq!(numeric_core("r09"), None);
    }
}
