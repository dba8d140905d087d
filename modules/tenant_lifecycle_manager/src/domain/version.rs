//! Module-id parsing and version comparison.
//!
//! A module id has the shape `name-semver[-prerelease][+build]`; the name itself
//! may contain dashes (`sample-module-1.0.0`), so splitting scans left to right
//! for the first dash that begins a parseable semantic version.

use std::cmp::Ordering;

use semver::Version;

/// Splits a module id into its name and parsed version, or `None` if no suffix
/// of the id parses as a semantic version.
pub fn split_module_id(id: &str) -> Option<(&str, Version)> {
    for (i, ch) in id.char_indices() {
        if ch != '-' {
            continue;
        }
        let rest = &id[i + 1..];
        if !rest.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        if let Ok(version) = Version::parse(rest) {
            return Some((&id[..i], version));
        }
    }
    None
}

/// The name portion of a module id, or the whole id when it carries no
/// recognizable version suffix.
pub fn module_name(id: &str) -> &str {
    split_module_id(id).map_or(id, |(name, _)| name)
}

pub fn module_version(id: &str) -> Option<Version> {
    split_module_id(id).map(|(_, v)| v)
}

/// Total order over two module ids by their version component. Ids that fail to
/// parse a version compare by name, breaking ties lexically.
pub fn compare_module_ids(a: &str, b: &str) -> Ordering {
    match (split_module_id(a), split_module_id(b)) {
        (Some((name_a, ver_a)), Some((name_b, ver_b))) if name_a == name_b => ver_a.cmp(&ver_b),
        _ => a.cmp(b),
    }
}

/// The source contract's `0..4` integer comparison code: `0` = strictly older,
/// `2` = equal, `4` = strictly newer. A code `>= 4` means the left side is newer.
pub fn compare_code(a: &str, b: &str) -> u8 {
    match compare_module_ids(a, b) {
        Ordering::Less => 0,
        Ordering::Equal => 2,
        Ordering::Greater => 4,
    }
}

pub fn is_strictly_newer(a: &str, b: &str) -> bool {
    compare_code(a, b) >= 4
}

/// Whether `id`'s version satisfies `min_version` under "same major, version >= min".
pub fn satisfies_min_version(id: &str, min_version: &str) -> bool {
    let Some((_, version)) = split_module_id(id) else { return false };
    let Ok(min) = Version::parse(min_version) else { return false };
    version.major == min.major && version >= min
}

/// Parses a loosely-specified version such as `"1.0"` or `"1"` by zero-filling
/// missing components, the way interface versions are written in module
/// descriptors (as opposed to the full semver module ids).
pub fn parse_loose_version(s: &str) -> Option<Version> {
    let mut parts: Vec<&str> = s.split('.').collect();
    while parts.len() < 3 {
        parts.push("0");
    }
    Version::parse(&parts.join(".")).ok()
}

/// Whether `provided` satisfies `min` under "same major, version >= min", for the
/// loose `"1.0"`/`"1.1"` version strings used on interface descriptors.
pub fn interface_satisfies(provided: &str, min: &str) -> bool {
    match (parse_loose_version(provided), parse_loose_version(min)) {
        (Some(p), Some(m)) => p.major == m.major && p >= m,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_ids() {
        let (name, version) = split_module_id("users-1.0.0").unwrap();
        assert_eq!(name, "users");
        assert_eq!(version, Version::new(1, 0, 0));
    }

    #[test]
    fn splits_dashed_names() {
        let (name, version) = split_module_id("sample-module-1.0.0").unwrap();
        assert_eq!(name, "sample-module");
        assert_eq!(version, Version::new(1, 0, 0));
    }

    #[test]
    fn splits_prerelease_and_build() {
        let (name, version) = split_module_id("mod-A-1.2.3-beta.1+build.7").unwrap();
        assert_eq!(name, "mod-A");
        assert_eq!(version.to_string(), "1.2.3-beta.1+build.7");
    }

    #[test]
    fn unversioned_id_has_no_split() {
        assert!(split_module_id("okapi").is_none());
        assert_eq!(module_name("okapi"), "okapi");
    }

    #[test]
    fn compare_orders_by_version() {
        assert_eq!(compare_module_ids("users-1.0.0", "users-1.1.0"), Ordering::Less);
        assert_eq!(compare_code("users-1.1.0", "users-1.0.0"), 4);
        assert!(is_strictly_newer("users-2.0.0", "users-1.9.9"));
        assert!(!is_strictly_newer("users-1.0.0", "users-1.0.0"));
    }

    #[test]
    fn min_version_requires_same_major() {
        assert!(satisfies_min_version("users-1.1.0", "1.0.0"));
        assert!(!satisfies_min_version("users-2.0.0", "1.0.0"));
        assert!(!satisfies_min_version("users-0.9.0", "1.0.0"));
    }

    #[test]
    fn interface_versions_compare_loosely() {
        assert!(interface_satisfies("1.1", "1.0"));
        assert!(interface_satisfies("1.0", "1.0"));
        assert!(!interface_satisfies("2.0", "1.0"));
        assert!(!interface_satisfies("1.0", "1.1"));
    }
}
