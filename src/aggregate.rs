use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::LazyLock;

use itertools::Itertools;
use regex::Regex;
use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::{ClassifiedRow, JoinedRow};

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());

/// Which taxonomy categories a tag query admits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Every row, unmapped tags included.
    #[default]
    Any,
    Only(BTreeSet<String>),
}

impl CategoryFilter {
    pub fn only<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CategoryFilter::Only(categories.into_iter().map(Into::into).collect())
    }

    pub fn admits(&self, category: Option<&str>) -> bool {
        match self {
            CategoryFilter::Any => true,
            CategoryFilter::Only(set) => category.is_some_and(|c| set.contains(c)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub left: String,
    pub right: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCounts {
    pub country: String,
    /// Chronological.
    pub years: Vec<(String, usize)>,
    pub undated: usize,
}

impl YearCounts {
    pub fn total(&self) -> usize {
        self.years.iter().map(|(_, n)| n).sum::<usize>() + self.undated
    }
}

/// Five-number summary of numeric publication years.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumber {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSpread {
    pub country: String,
    pub records: usize,
    pub dated: usize,
    pub summary: Option<FiveNumber>,
}

// ── Tag counts ──

/// Records per country: rows of `country_category`, counted by tag.
pub fn count_by_country(rows: &[JoinedRow], country_category: &str) -> Vec<(String, usize)> {
    tally(
        rows.iter()
            .filter(|r| r.category.as_deref() == Some(country_category))
            .map(|r| r.tag.as_str()),
    )
}

/// Records per tag across the admitted categories.
pub fn count_by_tag(rows: &[JoinedRow], filter: &CategoryFilter) -> Vec<(String, usize)> {
    tally(
        rows.iter()
            .filter(|r| filter.admits(r.category.as_deref()))
            .map(|r| r.tag.as_str()),
    )
}

/// Each record's country tags paired with its other tags, in (country, tag) order.
pub fn count_by_country_and_tag(rows: &[JoinedRow], country_category: &str) -> Vec<PairCount> {
    let is_country = |r: &JoinedRow| r.category.as_deref() == Some(country_category);
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for pair in pairs_per_record(rows, &is_country, |r| !is_country(r)) {
        *counts.entry(pair).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((left, right), count)| PairCount {
            left: left.to_string(),
            right: right.to_string(),
            count,
        })
        .collect()
}

/// Per-year record counts for one country tag of `country_category`.
pub fn count_by_year_for_country(
    rows: &[JoinedRow],
    country: &str,
    country_category: &str,
) -> YearCounts {
    let mut years: HashMap<&str, usize> = HashMap::new();
    let mut undated = 0;
    for r in rows
        .iter()
        .filter(|r| r.tag == country && r.category.as_deref() == Some(country_category))
    {
        match r.publication_year.as_deref() {
            Some(y) => *years.entry(y).or_default() += 1,
            None => undated += 1,
        }
    }

    let years = years
        .into_iter()
        .sorted_by_key(|(y, _)| (y.parse::<i64>().unwrap_or(i64::MAX), y.to_string()))
        .map(|(y, n)| (y.to_string(), n))
        .collect();
    YearCounts {
        country: country.to_string(),
        years,
        undated,
    }
}

/// Pair every `a`-tag of a record with every `b`-tag of the same record and count
/// the pairs. Records lacking either side contribute nothing.
pub fn cross_tabulate(rows: &[JoinedRow], a: &str, b: &str) -> Result<Vec<PairCount>> {
    if a.trim().is_empty() || b.trim().is_empty() {
        return Err(DashboardError::InvalidQuery(
            "cross-tabulation needs two category names".to_string(),
        ));
    }
    if a == b {
        return Err(DashboardError::InvalidQuery(format!(
            "cannot cross-tabulate category '{}' with itself",
            a
        )));
    }

    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for pair in pairs_per_record(
        rows,
        |r| r.category.as_deref() == Some(a),
        |r| r.category.as_deref() == Some(b),
    ) {
        *counts.entry(pair).or_default() += 1;
    }

    Ok(counts
        .into_iter()
        .sorted_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(&y.0)))
        .map(|((left, right), count)| PairCount {
            left: left.to_string(),
            right: right.to_string(),
            count,
        })
        .collect())
}

// ── Single-country view ──

/// Box-plot figures of publication years per selected country.
pub fn year_spread_by_country(rows: &[ClassifiedRow], countries: &[String]) -> Vec<YearSpread> {
    countries
        .iter()
        .map(|country| {
            let selected: Vec<&ClassifiedRow> =
                rows.iter().filter(|r| &r.country == country).collect();
            let mut years: Vec<f64> = selected
                .iter()
                .filter_map(|r| numeric_year(r.publication_year.as_deref()))
                .map(f64::from)
                .collect();
            years.sort_by(f64::total_cmp);
            YearSpread {
                country: country.clone(),
                records: selected.len(),
                dated: years.len(),
                summary: five_number(&years),
            }
        })
        .collect()
}

/// (country, year) points of the selected countries, for scatter and box charts.
pub fn year_points(rows: &[ClassifiedRow], countries: &[String]) -> Vec<(String, i32)> {
    rows.iter()
        .filter(|r| countries.contains(&r.country))
        .filter_map(|r| Some((r.country.clone(), numeric_year(r.publication_year.as_deref())?)))
        .collect()
}

fn numeric_year(year: Option<&str>) -> Option<i32> {
    year.filter(|y| YEAR_RE.is_match(y))?.parse().ok()
}

fn five_number(sorted: &[f64]) -> Option<FiveNumber> {
    Some(FiveNumber {
        min: *sorted.first()?,
        q1: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q3: quantile(sorted, 0.75),
        max: *sorted.last()?,
    })
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ── Helpers ──

/// Count occurrences, ordered by count descending then key ascending.
fn tally<'a, I>(keys: I) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for k in keys {
        *counts.entry(k).or_default() += 1;
    }
    counts
        .into_iter()
        .sorted_by(|x, y| y.1.cmp(&x.1).then_with(|| x.0.cmp(y.0)))
        .map(|(k, n)| (k.to_string(), n))
        .collect()
}

/// Self-join on record key: every left row's tag paired with each right-row tag
/// of the same record. Left rows keep table order.
fn pairs_per_record<'a, L, R>(rows: &'a [JoinedRow], left: L, right: R) -> Vec<(&'a str, &'a str)>
where
    L: Fn(&JoinedRow) -> bool,
    R: Fn(&JoinedRow) -> bool,
{
    let mut right_by_record: HashMap<&str, Vec<&str>> = HashMap::new();
    for r in rows.iter().filter(|r| right(*r)) {
        right_by_record
            .entry(r.record_key.as_str())
            .or_default()
            .push(r.tag.as_str());
    }

    rows.iter()
        .filter(|r| left(*r))
        .flat_map(|l| {
            right_by_record
                .get(l.record_key.as_str())
                .into_iter()
                .flatten()
                .map(move |tag| (l.tag.as_str(), *tag))
        })
        .collect()
}
