/// Country tags recognised by the single-country view, in display order.
pub const COUNTRIES: &[&str] = &["Czechoslovakia", "Poland", "Austria", "Hungary", "Yugoslavia"];

/// Taxonomy categories offered by default.
pub const CATEGORIES: &[&str] = &[
    "country of refuge",
    "event",
    "organization",
    "keyword",
    "location",
    "personality",
    "refugee group (by ethnicity)",
    "refugee group (by reason of refuge)",
    "refugee group (by region/country of origin)",
    "refugee group (type)",
    "state actor involved",
];

/// Taxonomy category whose tags name a country of refuge.
pub const COUNTRY_CATEGORY: &str = "country of refuge";

/// Country recorded by the single-country view when an item has no country tag.
pub const NOT_DEFINED: &str = "Not defined";

pub fn countries() -> Vec<String> {
    COUNTRIES.iter().map(|c| c.to_string()).collect()
}
