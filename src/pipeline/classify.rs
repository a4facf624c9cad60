use crate::catalog::NOT_DEFINED;
use crate::models::{BibItem, ClassifiedRow};

use super::normalize::year_of;

/// Single-country classification of one item.
///
/// Pairs the first allow-listed tag with the first tag outside the
/// allow-list. Items without any allow-listed tag fall back to
/// (`NOT_DEFINED`, first tag). Items whose tags are all countries, and
/// untagged items, yield nothing. Every other combination is dropped.
pub fn classify<S: AsRef<str>>(item: &BibItem, allowlist: &[S]) -> Option<ClassifiedRow> {
    let is_country = |tag: &str| allowlist.iter().any(|c| c.as_ref() == tag);

    let first = item.tags.first()?;
    let row = |country: &str, tag: &str| ClassifiedRow {
        record_key: item.key.clone(),
        publication_year: year_of(item),
        country: country.to_string(),
        tag: tag.to_string(),
    };

    match item.tags.iter().find(|t| is_country(t.as_str())) {
        Some(country) => item
            .tags
            .iter()
            .find(|t| !is_country(t.as_str()))
            .map(|other| row(country.as_str(), other.as_str())),
        None => Some(row(NOT_DEFINED, first.as_str())),
    }
}

pub fn classify_all<S: AsRef<str>>(items: &[BibItem], allowlist: &[S]) -> Vec<ClassifiedRow> {
    items.iter().filter_map(|i| classify(i, allowlist)).collect()
}
