use crate::models::{BibItem, TagRow};

/// First four characters of the parsed date, or the shorter prefix available.
pub fn year_of(item: &BibItem) -> Option<String> {
    item.parsed_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| d.chars().take(4).collect())
}

/// One row per (item, tag). Untagged items contribute nothing.
pub fn normalize(items: &[BibItem]) -> Vec<TagRow> {
    items.iter().flat_map(item_rows).collect()
}

fn item_rows(item: &BibItem) -> impl Iterator<Item = TagRow> + '_ {
    let year = year_of(item);
    item.tags.iter().map(move |tag| TagRow {
        record_key: item.key.clone(),
        publication_year: year.clone(),
        tag: tag.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, date: Option<&str>, tags: &[&str]) -> BibItem {
        BibItem {
            key: key.to_string(),
            creator_summary: None,
            parsed_date: date.map(str::to_string),
            title: format!("Title {}", key),
            item_type: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn year_is_date_prefix() {
        assert_eq!(year_of(&item("A", Some("1956-10-23"), &[])).as_deref(), Some("1956"));
        assert_eq!(year_of(&item("A", Some("1968"), &[])).as_deref(), Some("1968"));
        assert_eq!(year_of(&item("A", None, &[])), None);
    }

    #[test]
    fn short_date_yields_partial_year() {
        assert_eq!(year_of(&item("A", Some("19"), &[])).as_deref(), Some("19"));
        assert_eq!(year_of(&item("A", Some("c."), &[])).as_deref(), Some("c."));
        assert_eq!(year_of(&item("A", Some(""), &[])), None);
    }

    #[test]
    fn one_row_per_tag_in_order() {
        let rows = normalize(&[item("A", Some("1990-01-01"), &["Poland", "refugee", "Poland"])]);
        let tags: Vec<&str> = rows.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["Poland", "refugee", "Poland"]);
        assert!(rows.iter().all(|r| r.record_key == "A"));
        assert!(rows.iter().all(|r| r.publication_year.as_deref() == Some("1990")));
    }

    #[test]
    fn untagged_items_produce_no_rows() {
        let rows = normalize(&[
            item("A", Some("1990"), &[]),
            item("B", None, &["camp"]),
            item("C", Some("2004"), &[]),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record_key, "B");
        assert_eq!(rows[0].publication_year, None);
    }
}
