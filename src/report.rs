use itertools::Itertools;

use crate::aggregate::{PairCount, YearCounts, YearSpread};
use crate::models::{ClassifiedRow, MissingField, UntaggedItem};
use crate::pipeline::corpus::Corpus;

pub struct Summary {
    pub items: usize,
    pub tagged: usize,
    pub untagged: usize,
    pub rows: usize,
    pub unmapped_rows: usize,
    pub warnings: usize,
    pub by_type: Vec<(String, usize)>,
}

impl Summary {
    pub fn of(corpus: &Corpus) -> Self {
        let tagged = corpus.items().iter().filter(|i| i.is_tagged()).count();
        Summary {
            items: corpus.items().len(),
            tagged,
            untagged: corpus.items().len() - tagged,
            rows: corpus.rows().len(),
            unmapped_rows: corpus.rows().iter().filter(|r| r.category.is_none()).count(),
            warnings: corpus.warnings().len(),
            by_type: corpus
                .items()
                .iter()
                .map(|i| i.item_type.clone().unwrap_or_else(|| "unknown".to_string()))
                .counts()
                .into_iter()
                .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
                .collect(),
        }
    }

    pub fn print(&self) {
        println!("Items total:    {}", self.items);
        println!("Tagged:         {}", self.tagged);
        println!("Untagged:       {}", self.untagged);
        println!("Tag rows:       {}", self.rows);
        println!("Unmapped rows:  {}", self.unmapped_rows);
        println!("Field warnings: {}", self.warnings);
        if !self.by_type.is_empty() {
            println!("\n--- Item types ---");
            for (kind, n) in &self.by_type {
                println!("  {:<24} {:>5}", kind, n);
            }
        }
    }
}

/// Two-column ranking table: label | count.
pub fn print_counts(heading: &str, label: &str, rows: &[(String, usize)], limit: usize) {
    println!("{}", heading);
    if rows.is_empty() {
        println!("  (no records)\n");
        return;
    }
    println!("{:>3} | {:<40} | {:>7}", "#", label, "Records");
    println!("{}", "-".repeat(58));
    for (i, (tag, n)) in rows.iter().take(limit).enumerate() {
        println!("{:>3} | {:<40} | {:>7}", i + 1, truncate(tag, 40), n);
    }
    print_hidden(rows.len(), limit);
}

pub fn print_pairs(first: &str, second: &str, pairs: &[PairCount], limit: usize) {
    if pairs.is_empty() {
        println!("No records carry both a '{}' and a '{}' tag.\n", first, second);
        return;
    }
    println!(
        "{:<32} | {:<32} | {:>7}",
        truncate(first, 32),
        truncate(second, 32),
        "Records"
    );
    println!("{}", "-".repeat(77));
    for p in pairs.iter().take(limit) {
        println!(
            "{:<32} | {:<32} | {:>7}",
            truncate(&p.left, 32),
            truncate(&p.right, 32),
            p.count
        );
    }
    print_hidden(pairs.len(), limit);
}

pub fn print_years(counts: &YearCounts) {
    println!("{} ({} records)", counts.country, counts.total());
    if counts.years.is_empty() && counts.undated == 0 {
        println!("  (no records)\n");
        return;
    }
    let peak = counts.years.iter().map(|(_, n)| *n).max().unwrap_or(1).max(1);
    for (year, n) in &counts.years {
        let bar = "#".repeat((n * 40).div_ceil(peak));
        println!("  {:<6} {:>4} {}", year, n, bar);
    }
    if counts.undated > 0 {
        println!("  {:<6} {:>4}", "n.d.", counts.undated);
    }
    println!();
}

pub fn print_spread(spread: &[YearSpread]) {
    println!(
        "{:<16} | {:>7} | {:>5} | {:>6} | {:>6} | {:>6} | {:>6} | {:>6}",
        "Country", "Records", "Dated", "Min", "Q1", "Median", "Q3", "Max"
    );
    println!("{}", "-".repeat(82));
    for s in spread {
        match s.summary {
            Some(f) => println!(
                "{:<16} | {:>7} | {:>5} | {:>6.0} | {:>6.1} | {:>6.1} | {:>6.1} | {:>6.0}",
                truncate(&s.country, 16),
                s.records,
                s.dated,
                f.min,
                f.q1,
                f.median,
                f.q3,
                f.max
            ),
            None => println!(
                "{:<16} | {:>7} | {:>5} | {:>6} | {:>6} | {:>6} | {:>6} | {:>6}",
                truncate(&s.country, 16),
                s.records,
                s.dated,
                "-",
                "-",
                "-",
                "-",
                "-"
            ),
        }
    }
    println!();
}

pub fn print_classified(rows: &[ClassifiedRow], limit: usize) {
    println!(
        "{:<10} | {:<6} | {:<16} | {:<32}",
        "Key", "Year", "Country", "Tag"
    );
    println!("{}", "-".repeat(72));
    for r in rows.iter().take(limit) {
        println!(
            "{:<10} | {:<6} | {:<16} | {:<32}",
            r.record_key,
            r.publication_year.as_deref().unwrap_or("-"),
            truncate(&r.country, 16),
            truncate(&r.tag, 32)
        );
    }
    print_hidden(rows.len(), limit);
}

pub fn print_untagged(items: &[UntaggedItem]) {
    println!("Records without tags ({})", items.len());
    for item in items {
        match &item.link {
            Some(link) => println!("  [{}] {} <{}>", item.key, item.description(), link),
            None => println!("  [{}] {}", item.key, item.description()),
        }
    }
    println!();
}

pub fn print_warnings(warnings: &[MissingField], limit: usize) {
    if warnings.is_empty() {
        return;
    }
    println!("\n--- Missing fields ---");
    for w in warnings.iter().take(limit) {
        println!("  {}: no {}", w.record_key, w.field);
    }
    print_hidden(warnings.len(), limit);
}

fn print_hidden(total: usize, limit: usize) {
    if let Some(line) = hidden_line(total, limit) {
        println!("{}", line);
    }
    println!();
}

fn hidden_line(total: usize, limit: usize) -> Option<String> {
    (total > limit).then(|| format!("  ... {} more (raise --limit)", total - limit))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BibItem;
    use crate::pipeline::taxonomy::parse;

    #[test]
    fn truncate_keeps_width() {
        assert_eq!(truncate("Poland", 10), "Poland");
        assert_eq!(truncate("Hungarian revolution 1956", 12), "Hungarian...");
        assert_eq!(truncate("Hungarian revolution 1956", 12).chars().count(), 12);
    }

    #[test]
    fn hidden_rows_are_announced() {
        assert_eq!(hidden_line(3, 50), None);
        assert_eq!(hidden_line(50, 50), None);
        assert_eq!(hidden_line(62, 50).as_deref(), Some("  ... 12 more (raise --limit)"));
    }

    #[test]
    fn summary_counts() {
        let item = |key: &str, tags: &[&str]| BibItem {
            key: key.to_string(),
            creator_summary: None,
            parsed_date: None,
            title: String::new(),
            item_type: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        };
        let taxonomy = parse("Tag,Category\nexile,keyword\n");
        let corpus = Corpus::build(vec![item("A", &["exile", "camp"]), item("B", &[])], &taxonomy);
        let s = Summary::of(&corpus);
        assert_eq!((s.items, s.tagged, s.untagged), (2, 1, 1));
        assert_eq!((s.rows, s.unmapped_rows, s.warnings), (2, 1, 0));
        assert_eq!(s.by_type, vec![("unknown".to_string(), 2)]);
    }
}
