use chrono::{DateTime, Utc};
use tracing::info;

use crate::models::{BibItem, JoinedRow, MissingField, TagRow, UntaggedItem};

use super::normalize::normalize;
use super::taxonomy::Taxonomy;

/// Immutable session snapshot: the fetched items and their joined tag rows.
#[derive(Debug, Clone)]
pub struct Corpus {
    items: Vec<BibItem>,
    rows: Vec<JoinedRow>,
    warnings: Vec<MissingField>,
    built_at: DateTime<Utc>,
}

impl Corpus {
    pub fn build(items: Vec<BibItem>, taxonomy: &Taxonomy) -> Self {
        let rows = join(normalize(&items), taxonomy);
        let unmapped = rows.iter().filter(|r| r.category.is_none()).count();
        info!(
            "Corpus built: {} items, {} tag rows ({} unmapped)",
            items.len(),
            rows.len(),
            unmapped
        );
        Corpus {
            items,
            rows,
            warnings: Vec::new(),
            built_at: Utc::now(),
        }
    }

    /// Attach the field warnings collected while the items were normalized.
    pub fn with_warnings(mut self, warnings: Vec<MissingField>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn items(&self) -> &[BibItem] {
        &self.items
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn warnings(&self) -> &[MissingField] {
        &self.warnings
    }

    /// Snapshot version; queries over the same version are repeatable.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn untagged<F>(&self, link: F) -> Vec<UntaggedItem>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.items
            .iter()
            .filter(|i| !i.is_tagged())
            .map(|i| UntaggedItem {
                key: i.key.clone(),
                creator: i.creator_summary.clone(),
                title: i.title.clone(),
                link: link(&i.key),
            })
            .collect()
    }
}

/// Left join on exact tag text. Keeps every row, in input order.
pub fn join(rows: Vec<TagRow>, taxonomy: &Taxonomy) -> Vec<JoinedRow> {
    rows.into_iter()
        .map(|r| JoinedRow {
            category: taxonomy.category_of(&r.tag).map(str::to_string),
            record_key: r.record_key,
            publication_year: r.publication_year,
            tag: r.tag,
        })
        .collect()
}
