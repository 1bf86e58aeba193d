use regex::Regex;
use std::sync::LazyLock;

/// Matches a ` (<unit>)` suffix, e.g. the `(m**2/Hz)` in `spectral_energy (m**2/Hz)`.
static UNIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" \(([^)]+)\)").expect("unit pattern is a valid regex"));

/// Returns the unit label embedded in a raw field name, if there is one.
///
/// The label is returned as-is; no unit vocabulary is enforced. When a name
/// carries more than one parenthesized group, the first one wins.
pub fn extract_unit(field_name: &str) -> Option<&str> {
    UNIT_PATTERN
        .captures(field_name)
        .and_then(|captures| captures.get(1))
        .map(|unit| unit.as_str())
}
