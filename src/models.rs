use serde::Serialize;
use tracing::warn;

use crate::api_types::ApiItem;

/// A bibliographic record with missing-field defaults already resolved.
#[derive(Debug, Clone, Serialize)]
pub struct BibItem {
    pub key: String,
    pub creator_summary: Option<String>,
    pub parsed_date: Option<String>,
    pub title: String,
    pub item_type: Option<String>,
    pub tags: Vec<String>, // source order, untrimmed
}

/// A field an item arrived without. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingField {
    pub record_key: String,
    pub field: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRow {
    pub record_key: String,
    pub publication_year: Option<String>,
    pub tag: String,
}

/// Legacy single-country row: (record, year, country, other tag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRow {
    pub record_key: String,
    pub publication_year: Option<String>,
    pub country: String,
    pub tag: String,
}

/// A `TagRow` after the taxonomy join. `category` is None for unmapped tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedRow {
    pub record_key: String,
    pub publication_year: Option<String>,
    pub tag: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UntaggedItem {
    pub key: String,
    pub creator: Option<String>,
    pub title: String,
    pub link: Option<String>,
}

impl UntaggedItem {
    /// "Creator: Title", or just the title when no creator summary exists.
    pub fn description(&self) -> String {
        let title = if self.title.is_empty() { "(untitled)" } else { self.title.as_str() };
        match self.creator.as_deref() {
            Some(c) if !c.trim().is_empty() => format!("{}: {}", c, title),
            _ => title.to_string(),
        }
    }
}

impl BibItem {
    pub fn from_api(item: ApiItem) -> (BibItem, Vec<MissingField>) {
        let key = item.key;
        let mut missing = Vec::new();
        let mut note = |field: &'static str| {
            missing.push(MissingField {
                record_key: key.clone(),
                field,
            })
        };

        let parsed_date = item.meta.parsed_date.filter(|d| !d.trim().is_empty());
        if parsed_date.is_none() {
            note("parsedDate");
        }
        let title = match item.data.title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                note("title");
                String::new()
            }
        };
        let tags = match item.data.tags {
            Some(tags) => tags.into_iter().map(|t| t.tag).collect(),
            None => {
                note("tags");
                Vec::new()
            }
        };

        for m in &missing {
            warn!("Item {} has no {}", m.record_key, m.field);
        }

        let bib = BibItem {
            key,
            creator_summary: item.meta.creator_summary,
            parsed_date,
            title,
            item_type: item.data.item_type,
            tags,
        };
        (bib, missing)
    }

    pub fn is_tagged(&self) -> bool {
        !self.tags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_types::{ApiData, ApiMeta, ApiTag};

    fn api(key: &str, date: Option<&str>, title: Option<&str>, tags: Option<&[&str]>) -> ApiItem {
        ApiItem {
            key: key.to_string(),
            meta: ApiMeta {
                creator_summary: Some("Frankl".to_string()),
                parsed_date: date.map(str::to_string),
            },
            data: ApiData {
                title: title.map(str::to_string),
                item_type: Some("book".to_string()),
                tags: tags.map(|ts| {
                    ts.iter()
                        .map(|t| ApiTag { tag: t.to_string() })
                        .collect()
                }),
            },
        }
    }

    #[test]
    fn complete_item_has_no_warnings() {
        let (bib, missing) = BibItem::from_api(api(
            "K1",
            Some("1998-03-01"),
            Some("  Refuge in Prague "),
            Some(&["Poland", " refugee"]),
        ));
        assert!(missing.is_empty());
        assert_eq!(bib.title, "Refuge in Prague");
        // tags are join keys, left untouched
        assert_eq!(bib.tags, vec!["Poland", " refugee"]);
        assert_eq!(bib.creator_summary.as_deref(), Some("Frankl"));
    }

    #[test]
    fn missing_fields_are_null_filled() {
        let (bib, missing) = BibItem::from_api(api("K2", None, None, None));
        let fields: Vec<&str> = missing.iter().map(|m| m.field).collect();
        assert_eq!(fields, vec!["parsedDate", "title", "tags"]);
        assert!(missing.iter().all(|m| m.record_key == "K2"));
        assert!(bib.parsed_date.is_none());
        assert!(bib.title.is_empty());
        assert!(!bib.is_tagged());
    }

    #[test]
    fn untagged_description() {
        let mut item = UntaggedItem {
            key: "K5".to_string(),
            creator: Some("Frankl and Ther".to_string()),
            title: "Refugees in Interwar Europe".to_string(),
            link: None,
        };
        assert_eq!(item.description(), "Frankl and Ther: Refugees in Interwar Europe");
        item.creator = None;
        assert_eq!(item.description(), "Refugees in Interwar Europe");
        item.title.clear();
        assert_eq!(item.description(), "(untitled)");
    }

    #[test]
    fn blank_date_counts_as_missing() {
        let (bib, missing) = BibItem::from_api(api("K3", Some(""), Some("T"), Some(&[])));
        assert!(bib.parsed_date.is_none());
        assert_eq!(missing.len(), 1);
    }
}
