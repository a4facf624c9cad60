use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced to the CLI.
///
/// Source and taxonomy variants are fatal at session start. `InvalidQuery` is
/// returned by the aggregation layer and never carries a partial result.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("bibliographic source request to {url} failed: {source}")]
    SourceFetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("bibliographic source returned malformed data: {0}")]
    SourceMalformed(String),
    #[error("could not read item snapshot {path:?}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bibliographic source is not configured: {0}")]
    SourceConfig(String),
    #[error("could not load taxonomy {path:?}: {source}")]
    TaxonomyLoad {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("taxonomy {path:?} has no '{column}' column")]
    TaxonomyColumn { path: PathBuf, column: &'static str },
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
