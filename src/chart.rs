use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use crate::aggregate::{PairCount, YearCounts};

const SCHEMA: &str = "https://vega.github.io/schema/vega-lite/v5.json";

/// Bar chart of labelled counts; bar size and colour follow the count.
pub fn bar_chart(title: &str, label_field: &str, count_field: &str, rows: &[(String, usize)]) -> Value {
    let values: Vec<Value> = rows
        .iter()
        .map(|(label, count)| record(&[(label_field, json!(label)), (count_field, json!(count))]))
        .collect();
    json!({
        "$schema": SCHEMA,
        "title": title,
        "width": "container",
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": { "field": label_field, "type": "nominal", "sort": "-y" },
            "y": { "field": count_field, "type": "quantitative" },
            "size": { "field": count_field, "type": "quantitative", "legend": null },
            "color": { "field": count_field, "type": "quantitative" }
        }
    })
}

/// Records per publication year for one country, years left in chronological order.
pub fn year_chart(counts: &YearCounts) -> Value {
    let values: Vec<Value> = counts
        .years
        .iter()
        .map(|(year, n)| json!({ "Publication year": year, "Number per year": n }))
        .collect();
    json!({
        "$schema": SCHEMA,
        "title": counts.country,
        "width": "container",
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": { "field": "Publication year", "type": "ordinal", "sort": null },
            "y": { "field": "Number per year", "type": "quantitative" },
            "color": { "field": "Number per year", "type": "quantitative" }
        }
    })
}

/// Heatmap of a two-category cross-tabulation.
pub fn heatmap(first: &str, second: &str, pairs: &[PairCount]) -> Value {
    let values: Vec<Value> = pairs
        .iter()
        .map(|p| {
            record(&[
                (first, json!(p.left)),
                (second, json!(p.right)),
                ("Number of records", json!(p.count)),
            ])
        })
        .collect();
    json!({
        "$schema": SCHEMA,
        "title": format!("{} × {}", first, second),
        "data": { "values": values },
        "mark": "rect",
        "encoding": {
            "x": { "field": first, "type": "nominal" },
            "y": { "field": second, "type": "nominal" },
            "color": { "field": "Number of records", "type": "quantitative" },
            "tooltip": [
                { "field": first },
                { "field": second },
                { "field": "Number of records", "type": "quantitative" }
            ]
        }
    })
}

/// Box plot of publication years per country.
pub fn year_boxplot(points: &[(String, i32)]) -> Value {
    year_points_chart("Publication years per country", json!({ "type": "boxplot", "extent": 1.5 }), points)
}

/// Scatter of publication years per country.
pub fn year_scatter(points: &[(String, i32)]) -> Value {
    year_points_chart("Refugee bibliography per country (scatter)", json!("point"), points)
}

fn year_points_chart(title: &str, mark: Value, points: &[(String, i32)]) -> Value {
    let values: Vec<Value> = points
        .iter()
        .map(|(country, year)| json!({ "country": country, "publication_year": year }))
        .collect();
    json!({
        "$schema": SCHEMA,
        "title": title,
        "data": { "values": values },
        "mark": mark,
        "encoding": {
            "x": { "field": "country", "type": "nominal" },
            "y": {
                "field": "publication_year",
                "type": "quantitative",
                "scale": { "zero": false }
            }
        }
    })
}

fn record(fields: &[(&str, Value)]) -> Value {
    let map: Map<String, Value> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    Value::Object(map)
}

/// Write `spec` as `<dir>/<name>.vl.json`, creating `dir` if needed.
pub fn write_chart(dir: &Path, name: &str, spec: &Value) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
    let path = dir.join(format!("{}.vl.json", file_stem(name)));
    fs::write(&path, serde_json::to_vec_pretty(spec)?)
        .with_context(|| format!("write {:?}", path))?;
    Ok(path)
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    stem.split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_carries_rows_in_order() {
        let rows = vec![("Poland".to_string(), 2), ("Austria".to_string(), 1)];
        let spec = bar_chart("Records per country", "Country of refuge", "Number of records", &rows);
        let values = spec["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["Country of refuge"], "Poland");
        assert_eq!(values[0]["Number of records"], 2);
        assert_eq!(spec["encoding"]["x"]["field"], "Country of refuge");
        assert_eq!(spec["mark"], "bar");
    }

    #[test]
    fn year_chart_keeps_chronology() {
        let counts = YearCounts {
            country: "Austria".to_string(),
            years: vec![("1956".to_string(), 3), ("1968".to_string(), 1)],
            undated: 2,
        };
        let spec = year_chart(&counts);
        assert_eq!(spec["title"], "Austria");
        assert_eq!(spec["encoding"]["x"]["sort"], Value::Null);
        assert_eq!(spec["data"]["values"][1]["Publication year"], "1968");
    }

    #[test]
    fn heatmap_uses_category_names_as_fields() {
        let pairs = vec![PairCount {
            left: "Prague Spring".to_string(),
            right: "exile".to_string(),
            count: 4,
        }];
        let spec = heatmap("event", "keyword", &pairs);
        assert_eq!(spec["data"]["values"][0]["event"], "Prague Spring");
        assert_eq!(spec["data"]["values"][0]["keyword"], "exile");
        assert_eq!(spec["data"]["values"][0]["Number of records"], 4);
    }

    #[test]
    fn boxplot_and_scatter_share_points() {
        let points = vec![("Poland".to_string(), 1950), ("Poland".to_string(), 1961)];
        let boxplot = year_boxplot(&points);
        let scatter = year_scatter(&points);
        assert_eq!(boxplot["mark"]["type"], "boxplot");
        assert_eq!(scatter["mark"], "point");
        assert_eq!(boxplot["data"], scatter["data"]);
    }

    #[test]
    fn stems_are_file_safe() {
        assert_eq!(file_stem("Records per country"), "records-per-country");
        assert_eq!(file_stem("event × refugee group (type)"), "event-refugee-group-type");
    }

    #[test]
    fn writes_pretty_json() {
        let dir = std::env::temp_dir().join(format!("unref-charts-{}", std::process::id()));
        let spec = json!({ "mark": "bar" });
        let path = write_chart(&dir, "Records per tag", &spec).unwrap();
        assert!(path.ends_with("records-per-tag.vl.json"));
        let back: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(back, spec);
        fs::remove_dir_all(&dir).unwrap();
    }
}
