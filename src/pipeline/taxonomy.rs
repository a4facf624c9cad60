use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, Result};

const TAG_COLUMN: &str = "Tag";
const CATEGORY_COLUMN: &str = "Category";

/// Tag → category reference table, indexed once per session.
///
/// Duplicate rows agreeing on the category collapse into one entry. A tag
/// listed under two different categories is left unmapped and reported in
/// `conflicts`.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    entries: HashMap<String, String>,
    conflicts: BTreeSet<String>,
}

impl Taxonomy {
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| DashboardError::TaxonomyLoad {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        let taxonomy = Self::from_reader(file, path)?;
        info!(
            "Loaded taxonomy {:?}: {} tags, {} categories, {} conflicts",
            path,
            taxonomy.len(),
            taxonomy.categories().len(),
            taxonomy.conflicts.len()
        );
        Ok(taxonomy)
    }

    /// Parse CSV with `Tag` and `Category` header columns; other columns are ignored.
    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        let load_err = |source: csv::Error| DashboardError::TaxonomyLoad {
            path: origin.to_path_buf(),
            source,
        };

        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers().map_err(load_err)?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| DashboardError::TaxonomyColumn {
                    path: origin.to_path_buf(),
                    column: name,
                })
        };
        let tag_idx = column(TAG_COLUMN)?;
        let category_idx = column(CATEGORY_COLUMN)?;

        let mut taxonomy = Taxonomy::default();
        for (line, record) in rdr.records().enumerate() {
            let record = record.map_err(load_err)?;
            let tag = record.get(tag_idx).unwrap_or_default();
            let category = record.get(category_idx).unwrap_or_default();
            if tag.is_empty() || category.is_empty() {
                debug!("Skipping taxonomy row {}: empty tag or category", line + 2);
                continue;
            }
            taxonomy.insert(tag, category);
        }
        Ok(taxonomy)
    }

    fn insert(&mut self, tag: &str, category: &str) {
        if self.conflicts.contains(tag) {
            return;
        }
        match self.entries.get(tag) {
            Some(existing) if existing == category => {}
            Some(existing) => {
                warn!(
                    "Tag '{}' listed as both '{}' and '{}'; leaving it unmapped",
                    tag, existing, category
                );
                self.entries.remove(tag);
                self.conflicts.insert(tag.to_string());
            }
            None => {
                self.entries.insert(tag.to_string(), category.to_string());
            }
        }
    }

    /// Exact, case- and whitespace-sensitive lookup.
    pub fn category_of(&self, tag: &str) -> Option<&str> {
        self.entries.get(tag).map(String::as_str)
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.entries.values().map(String::as_str).collect()
    }

    /// Tags mapped to `category`, alphabetically.
    pub fn tags_in(&self, category: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, c)| c.as_str() == category)
            .map(|(t, _)| t.as_str())
            .sorted()
            .collect()
    }

    pub fn conflicts(&self) -> &BTreeSet<String> {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn parse(csv: &str) -> Taxonomy {
    Taxonomy::from_reader(csv.as_bytes(), Path::new("inline.csv")).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact() {
        let t = parse("Tag,Category\nPoland,country of refuge\nHungarian revolution 1956,event\n");
        assert_eq!(t.category_of("Poland"), Some("country of refuge"));
        assert_eq!(t.category_of("poland"), None);
        assert_eq!(t.category_of("Poland "), None);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn extra_columns_and_order_ignored() {
        let t = parse("Id,Category,Tag,Note\n1,event,Prague Spring,x\n2,keyword,exile,\n");
        assert_eq!(t.category_of("Prague Spring"), Some("event"));
        assert_eq!(t.category_of("exile"), Some("keyword"));
    }

    #[test]
    fn tags_in_category() {
        let t = parse("Tag,Category\nPoland,country of refuge\nGermany,country of refuge\nexile,keyword\n");
        assert_eq!(t.tags_in("country of refuge"), vec!["Germany", "Poland"]);
        assert!(t.tags_in("event").is_empty());
    }

    #[test]
    fn duplicate_rows_collapse() {
        let t = parse("Tag,Category\nexile,keyword\nexile,keyword\n");
        assert_eq!(t.len(), 1);
        assert!(t.conflicts().is_empty());
    }

    #[test]
    fn conflicting_rows_leave_tag_unmapped() {
        let t = parse("Tag,Category\nVienna,location\nVienna,keyword\nVienna,location\n");
        assert_eq!(t.category_of("Vienna"), None);
        assert!(t.conflicts().contains("Vienna"));
    }

    #[test]
    fn empty_cells_skipped() {
        let t = parse("Tag,Category\n,event\ncamp,\nborder,location\n");
        assert_eq!(t.len(), 1);
        assert_eq!(t.categories().into_iter().collect::<Vec<_>>(), vec!["location"]);
    }

    #[test]
    fn missing_column_is_error() {
        let err = Taxonomy::from_reader("Tag,Kind\nexile,keyword\n".as_bytes(), Path::new("bad.csv"))
            .unwrap_err();
        assert!(matches!(err, DashboardError::TaxonomyColumn { column: "Category", .. }));
    }

    #[test]
    fn ragged_row_is_error() {
        let res = Taxonomy::from_reader("Tag,Category\nexile,keyword,extra\n".as_bytes(), Path::new("bad.csv"));
        assert!(matches!(res, Err(DashboardError::TaxonomyLoad { .. })));
    }

    #[test]
    fn missing_file_is_error() {
        let res = Taxonomy::load(Path::new("tests/fixtures/does_not_exist.csv"));
        assert!(matches!(res, Err(DashboardError::TaxonomyLoad { .. })));
    }

    #[test]
    fn fixture_loads() {
        let t = Taxonomy::load(Path::new("tests/fixtures/tags.csv")).unwrap();
        assert_eq!(t.category_of("Poland"), Some("country of refuge"));
        assert!(!t.is_empty());
    }
}
