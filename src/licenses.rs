//! License classifier: maps license codes to the capability groups they
//! belong to.
//!
//! Group membership is a static, precomputed table; comparisons against an
//! item's license code are case-insensitive.

const ALL_CC: &[&str] = &[
    "by", "by-nc", "by-nc-nd", "by-nc-sa", "by-nd", "by-sa", "pdm", "cc0",
];

/// Licenses whose terms allow commercial use (no NC clause).
const COMMERCIAL: &[&str] = &["by", "by-nd", "by-sa", "pdm", "cc0"];

/// Licenses whose terms allow modification (no ND clause).
const MODIFICATION: &[&str] = &["by", "by-nc", "by-nc-sa", "by-sa", "pdm", "cc0"];

/// Look up the license codes belonging to a named group.
pub fn group_members(group: &str) -> Option<&'static [&'static str]> {
    match group.to_lowercase().as_str() {
        "all" | "all-cc" => Some(ALL_CC),
        "commercial" => Some(COMMERCIAL),
        "modification" => Some(MODIFICATION),
        _ => None,
    }
}

/// All group names a license code belongs to.
pub fn groups_for(license: &str) -> Vec<&'static str> {
    ["all", "all-cc", "commercial", "modification"]
        .into_iter()
        .filter(|group| is_in_group(license, group))
        .collect()
}

/// Case-insensitive membership test for a license code in a named group.
///
/// Unknown group names match nothing.
pub fn is_in_group(license: &str, group: &str) -> bool {
    let license = license.to_lowercase();
    group_members(group)
        .map(|members| members.contains(&license.as_str()))
        .unwrap_or(false)
}

/// True when the license belongs to every requested group.
///
/// This is the runtime predicate behind `license_type=a,b`: conjunction
/// across groups, equivalent to membership in their precomputed intersection.
pub fn in_all_groups(license: &str, groups: &[String]) -> bool {
    groups.iter().all(|group| is_in_group(license, group))
}
