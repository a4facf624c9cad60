mod aggregate;
mod api_types;
mod catalog;
mod chart;
mod config;
mod error;
mod models;
mod pipeline;
mod report;
mod selection;
mod zotero;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};

use crate::aggregate::CategoryFilter;
use crate::catalog::{COUNTRIES, COUNTRY_CATEGORY};
use crate::config::Settings;
use crate::models::JoinedRow;
use crate::pipeline::corpus::Corpus;
use crate::pipeline::taxonomy::Taxonomy;
use crate::selection::Selection;

#[derive(Parser)]
#[command(
    name = "unref_dashboard",
    about = "Statistics over the UnRef refugee bibliography (Zotero)"
)]
struct Cli {
    /// Config file (default: ./unref.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Read items from a saved API response instead of fetching them
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,
    /// Tag taxonomy CSV (overrides taxonomy_path)
    #[arg(short, long, global = true)]
    taxonomy: Option<PathBuf>,
    /// Write Vega-Lite chart specs into this directory
    #[arg(long, global = true)]
    charts: Option<PathBuf>,
    /// Max rows per table
    #[arg(short = 'n', long, global = true, default_value = "50")]
    limit: usize,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Corpus overview: items, tag rows, field warnings
    Summary,
    /// Records per country of refuge
    General,
    /// Publication years per country of refuge
    Countries {
        /// Country to show (repeatable; default: all)
        #[arg(short, long = "country")]
        countries: Vec<String>,
    },
    /// Records per tag
    Tags {
        /// Tag category to count (repeatable; default: the category catalog)
        #[arg(short = 'k', long = "category")]
        categories: Vec<String>,
        /// Count every tag, including tags the taxonomy does not know
        #[arg(long, conflicts_with = "categories")]
        all: bool,
        /// Country x tag pairs instead of plain tag counts
        #[arg(long)]
        by_country: bool,
        /// Also list records without any tag
        #[arg(long)]
        untagged: bool,
    },
    /// Cross-tabulate the tags of two categories
    Compare {
        /// First category (e.g. "event")
        first: String,
        /// Second category (e.g. "keyword")
        second: String,
    },
    /// Single-country view: one country and one tag per record
    Legacy {
        /// Country to show (repeatable; default: all)
        #[arg(short, long = "country")]
        countries: Vec<String>,
        /// Print the classified rows
        #[arg(long)]
        rows: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    let taxonomy = load_taxonomy(&cli, &settings)?;
    let api_items = match &cli.input {
        Some(path) => zotero::read_items(path)?,
        None => zotero::fetch_items(&settings).await?,
    };
    let corpus = pipeline::build_corpus(api_items, &taxonomy);
    let charts = cli.charts.as_deref();

    let result = match &cli.command {
        Commands::Summary => {
            report::Summary::of(&corpus).print();
            println!("Taxonomy:       {} tags", taxonomy.len());
            if !taxonomy.conflicts().is_empty() {
                println!(
                    "Conflicting:    {}",
                    taxonomy.conflicts().iter().cloned().collect::<Vec<_>>().join(", ")
                );
            }
            report::print_warnings(corpus.warnings(), cli.limit);
            println!("\nSnapshot taken {}", corpus.built_at().format("%Y-%m-%d %H:%M:%S UTC"));
            Ok(())
        }
        Commands::General => {
            println!("Items total: {}\n", corpus.items().len());
            let counts = aggregate::count_by_country(corpus.rows(), COUNTRY_CATEGORY);
            report::print_counts("Records per country", "Country of refuge", &counts, cli.limit);
            emit_chart(
                charts,
                "Records per country",
                &chart::bar_chart(
                    "Records per country",
                    "Country of refuge",
                    "Number of records",
                    &counts,
                ),
            )
        }
        Commands::Countries { countries } => {
            let selection = Selection::refuge(&taxonomy).with_countries(countries)?;
            println!("Publication years per country of refuge\n");
            for country in &selection.countries {
                let counts =
                    aggregate::count_by_year_for_country(corpus.rows(), country, COUNTRY_CATEGORY);
                report::print_years(&counts);
                emit_chart(
                    charts,
                    &format!("years {}", country),
                    &chart::year_chart(&counts),
                )?;
            }
            Ok(())
        }
        Commands::Tags {
            categories,
            all,
            by_country,
            untagged,
        } => {
            let selection = if *all {
                Selection::default().with_any_category()
            } else {
                Selection::default().with_categories(categories, &taxonomy)?
            };

            if *by_country {
                let rows = rows_in(corpus.rows(), &selection.categories);
                let pairs = aggregate::count_by_country_and_tag(&rows, COUNTRY_CATEGORY);
                println!("Records per country and tag\n");
                report::print_pairs("Country of refuge", "Tag", &pairs, cli.limit);
                emit_chart(
                    charts,
                    "Records per country and tag",
                    &chart::heatmap("Country of refuge", "Tag", &pairs),
                )?;
            } else {
                let counts = aggregate::count_by_tag(corpus.rows(), &selection.categories);
                report::print_counts("Records per tag", "Tag", &counts, cli.limit);
                emit_chart(
                    charts,
                    "Records per tag",
                    &chart::bar_chart("Records per tag", "Tag", "Number of records", &counts),
                )?;
            }

            if *untagged {
                let items = corpus.untagged(|key| settings.item_link(key));
                report::print_untagged(&items);
            }
            Ok(())
        }
        Commands::Compare { first, second } => {
            selection::check_category(first, &taxonomy)?;
            selection::check_category(second, &taxonomy)?;
            let pairs = aggregate::cross_tabulate(corpus.rows(), first, second)?;
            println!("Comparison: {} x {}\n", first, second);
            report::print_pairs(first, second, &pairs, cli.limit);
            emit_chart(
                charts,
                &format!("compare {} {}", first, second),
                &chart::heatmap(first, second, &pairs),
            )
        }
        Commands::Legacy { countries, rows } => {
            let selection = Selection::legacy().with_countries(countries)?;
            run_legacy(&corpus, &selection, *rows, cli.limit, charts)
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn load_taxonomy(cli: &Cli, settings: &Settings) -> anyhow::Result<Taxonomy> {
    let path = cli
        .taxonomy
        .clone()
        .unwrap_or_else(|| settings.taxonomy_path.clone());
    let taxonomy = Taxonomy::load(&path)
        .with_context(|| format!("Tag taxonomy is required ({:?})", path))?;
    if taxonomy.is_empty() {
        warn!("Taxonomy {:?} maps no tags; every tag will be unmapped", path);
    }
    if !taxonomy.conflicts().is_empty() {
        warn!(
            "{} tags left unmapped because the taxonomy gives them two categories",
            taxonomy.conflicts().len()
        );
    }
    Ok(taxonomy)
}

/// Country rows plus the rows the filter admits.
fn rows_in(rows: &[JoinedRow], filter: &CategoryFilter) -> Vec<JoinedRow> {
    rows.iter()
        .filter(|r| r.category.as_deref() == Some(COUNTRY_CATEGORY) || filter.admits(r.category.as_deref()))
        .cloned()
        .collect()
}

fn run_legacy(
    corpus: &Corpus,
    selection: &Selection,
    show_rows: bool,
    limit: usize,
    charts: Option<&Path>,
) -> anyhow::Result<()> {
    let classified = pipeline::classify::classify_all(corpus.items(), COUNTRIES);
    let tagged = corpus.items().iter().filter(|i| i.is_tagged()).count();
    info!(
        "Classified {} of {} tagged items ({} dropped)",
        classified.len(),
        tagged,
        tagged - classified.len()
    );

    println!("Publication years per country (one country per record)\n");
    let spread = aggregate::year_spread_by_country(&classified, &selection.countries);
    report::print_spread(&spread);

    if show_rows {
        let shown: Vec<_> = classified
            .iter()
            .filter(|r| selection.countries.contains(&r.country))
            .cloned()
            .collect();
        report::print_classified(&shown, limit);
    }

    let points = aggregate::year_points(&classified, &selection.countries);
    emit_chart(charts, "Legacy boxplot", &chart::year_boxplot(&points))?;
    emit_chart(charts, "Legacy scatter", &chart::year_scatter(&points))
}

fn emit_chart(dir: Option<&Path>, name: &str, spec: &Value) -> anyhow::Result<()> {
    if let Some(dir) = dir {
        let path = chart::write_chart(dir, name, spec)?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
