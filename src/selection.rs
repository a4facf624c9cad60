use itertools::Itertools;

use crate::aggregate::CategoryFilter;
use crate::catalog::{self, CATEGORIES, COUNTRIES, COUNTRY_CATEGORY};
use crate::error::{DashboardError, Result};
use crate::pipeline::taxonomy::Taxonomy;

/// The user's current picks. Starts from the full catalogs; the catalogs
/// themselves are never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub countries: Vec<String>,
    pub categories: CategoryFilter,
    country_catalog: Vec<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::legacy()
    }
}

impl Selection {
    fn with_catalog(country_catalog: Vec<String>) -> Self {
        Selection {
            countries: country_catalog.clone(),
            categories: CategoryFilter::only(CATEGORIES.iter().copied()),
            country_catalog,
        }
    }

    /// Countries of the single-country view: the fixed allow-list.
    pub fn legacy() -> Self {
        Self::with_catalog(catalog::countries())
    }

    /// Countries of refuge as the taxonomy tags them. Allow-list countries
    /// come first in their usual order, further taxonomy countries follow
    /// alphabetically.
    pub fn refuge(taxonomy: &Taxonomy) -> Self {
        let countries = COUNTRIES
            .iter()
            .copied()
            .chain(taxonomy.tags_in(COUNTRY_CATEGORY))
            .unique()
            .map(str::to_string)
            .collect();
        Self::with_catalog(countries)
    }

    /// Restrict to `requested` countries (all when empty), in the order given.
    pub fn with_countries(mut self, requested: &[String]) -> Result<Self> {
        if requested.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = requested
            .iter()
            .find(|c| !self.country_catalog.contains(*c))
        {
            return Err(DashboardError::InvalidQuery(format!(
                "unknown country '{}' (choose from: {})",
                unknown,
                self.country_catalog.join(", ")
            )));
        }
        self.countries = requested.iter().unique().cloned().collect();
        Ok(self)
    }

    /// Restrict to `requested` categories (the default catalog when empty).
    pub fn with_categories(mut self, requested: &[String], taxonomy: &Taxonomy) -> Result<Self> {
        if requested.is_empty() {
            return Ok(self);
        }
        for category in requested {
            check_category(category, taxonomy)?;
        }
        self.categories = CategoryFilter::only(requested.iter().cloned());
        Ok(self)
    }

    /// Admit every row, unmapped tags included.
    pub fn with_any_category(mut self) -> Self {
        self.categories = CategoryFilter::Any;
        self
    }
}

/// A category is known when it is in the catalog or used by the taxonomy.
pub fn check_category(category: &str, taxonomy: &Taxonomy) -> Result<()> {
    if category.trim().is_empty() {
        return Err(DashboardError::InvalidQuery(
            "category must not be blank".to_string(),
        ));
    }
    if CATEGORIES.contains(&category) || taxonomy.categories().contains(category) {
        Ok(())
    } else {
        Err(DashboardError::InvalidQuery(format!(
            "unknown category '{}'",
            category
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::taxonomy::parse;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_is_full_catalog() {
        let s = Selection::default();
        assert_eq!(s.countries.len(), COUNTRIES.len());
        assert!(s.categories.admits(Some("event")));
        assert!(!s.categories.admits(None));
    }

    #[test]
    fn countries_narrowed_and_deduped() {
        let s = Selection::default()
            .with_countries(&strings(&["Poland", "Austria", "Poland"]))
            .unwrap();
        assert_eq!(s.countries, strings(&["Poland", "Austria"]));
        // catalog untouched
        assert_eq!(catalog::countries().len(), 5);
    }

    #[test]
    fn unknown_country_rejected() {
        let res = Selection::default().with_countries(&strings(&["Atlantis"]));
        assert!(matches!(res, Err(DashboardError::InvalidQuery(_))));
    }

    #[test]
    fn refuge_countries_come_from_taxonomy() {
        let t = parse("Tag,Category\nGermany,country of refuge\nPoland,country of refuge\nexile,keyword\n");
        let s = Selection::refuge(&t);
        assert_eq!(
            s.countries,
            strings(&["Czechoslovakia", "Poland", "Austria", "Hungary", "Yugoslavia", "Germany"])
        );
        let s = s.with_countries(&strings(&["Germany"])).unwrap();
        assert_eq!(s.countries, strings(&["Germany"]));
    }

    #[test]
    fn legacy_view_keeps_allow_list() {
        let res = Selection::legacy().with_countries(&strings(&["Germany"]));
        assert!(matches!(res, Err(DashboardError::InvalidQuery(_))));
    }

    #[test]
    fn categories_from_taxonomy_accepted() {
        let t = parse("Tag,Category\nbarracks,site\n");
        let s = Selection::default()
            .with_categories(&strings(&["site", "event"]), &t)
            .unwrap();
        assert!(s.categories.admits(Some("site")));
        assert!(!s.categories.admits(Some("keyword")));
    }

    #[test]
    fn unknown_category_rejected() {
        let t = parse("Tag,Category\nbarracks,site\n");
        let res = Selection::default().with_categories(&strings(&["weather"]), &t);
        assert!(matches!(res, Err(DashboardError::InvalidQuery(_))));
    }

    #[test]
    fn category_check_catches_typos() {
        let t = parse("Tag,Category\nexile,keyword\n");
        assert!(check_category("keyword", &t).is_ok());
        assert!(check_category("organization", &t).is_ok());
        assert!(matches!(check_category("keywrd", &t), Err(DashboardError::InvalidQuery(_))));
        assert!(matches!(check_category("  ", &t), Err(DashboardError::InvalidQuery(_))));
    }

    #[test]
    fn any_category_admits_unmapped() {
        assert!(Selection::default().with_any_category().categories.admits(None));
    }
}
