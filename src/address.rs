//! ZIP code extraction from free-text addresses.

use regex::Regex;
use std::sync::LazyLock;

// ASCII digits and word boundaries only, so a 5-digit run inside a longer
// number or word never matches
static ZIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)[0-9]{5}(?-u:\b)").expect("valid ZIP pattern"));

/// Return the first standalone run of exactly five digits.
///
/// This is a pattern match, not address validation: the digits are not
/// checked against any postal database.
pub fn extract_zip_from_address(address: &str) -> Option<&str> {
    ZIP_RE.find(address).map(|m| m.as_str())
}
