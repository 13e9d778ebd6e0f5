//! Brand normalization
//!
//! Free-text brand names from input sheets arrive with random casing and
//! spacing ("  bosch ", "Mann  filter"). The catalog's brand filter expects
//! a single canonical spelling, so every brand is normalized before it is
//! used in a search URL or written to the report.

/// Canonicalize a brand string into its matching key.
///
/// Trims the input, collapses whitespace runs into a single space and
/// upper-cases every letter. Empty input yields an empty string.
pub fn normalize_brand(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Same as [`normalize_brand`] for optional input.
pub fn normalize_optional_brand(raw: Option<&str>) -> String {
    raw.map(normalize_brand).unwrap_or_default()
}
