//! Attribution string derivation for licensed works.
//!
//! The attribution is computed on read, never stored. Works with a missing
//! title or creator get a degraded but still well-formed sentence.

/// Build the attribution string for a work.
///
/// Formatting rules:
/// - both title and creator absent: the sentence starts with `This work`;
/// - creator absent: no `by ` credit fragment appears at all;
/// - title present: included verbatim, wrapped in quotes;
/// - the license citation (uppercased code, version, canonical URL) is always
///   appended.
pub fn attribution(
    title: Option<&str>,
    creator: Option<&str>,
    license: &str,
    license_version: &str,
    license_url: &str,
) -> String {
    let subject = match title {
        Some(title) if !title.is_empty() => format!("\"{title}\" "),
        _ => "This work ".to_string(),
    };
    let credit = match creator {
        Some(creator) if !creator.is_empty() => format!("by {creator} "),
        _ => String::new(),
    };

    format!(
        "{subject}{credit}is licensed under CC-{} {}. To view a copy of this license, visit {}.",
        license.to_uppercase(),
        license_version,
        license_url
    )
}

/// Derive the canonical Creative Commons deed URL for a license code.
///
/// Used whenever the stored metadata carries no usable URL.
pub fn canonical_license_url(license: &str, license_version: &str) -> String {
    match license.to_lowercase().as_str() {
        "cc0" => "https://creativecommons.org/publicdomain/zero/1.0/".to_string(),
        "pdm" => "https://creativecommons.org/publicdomain/mark/1.0/".to_string(),
        code => format!("https://creativecommons.org/licenses/{code}/{license_version}/"),
    }
}
