use std::path::Path;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::api_types::ApiItem;
use crate::config::Settings;
use crate::error::{DashboardError, Result};

const PAGE_SIZE: usize = 100;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;
const API_VERSION: &str = "3";

struct Page {
    body: String,
    total: Option<usize>,
}

/// Items endpoint of the configured library, scoped to the collection if one is set.
pub fn items_url(settings: &Settings) -> Result<String> {
    let library_id = settings
        .library_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            DashboardError::SourceConfig(
                "no library id (set ZOTERO_LIBRARY_ID or library_id, or pass --input)".to_string(),
            )
        })?;

    let mut url = format!(
        "{}/{}/{}",
        settings.api_base.trim_end_matches('/'),
        settings.library_type.path_segment(),
        library_id.trim()
    );
    if let Some(collection) = settings.collection.as_deref().filter(|c| !c.is_empty()) {
        url.push_str("/collections/");
        url.push_str(collection);
    }
    url.push_str("/items");
    Ok(url)
}

/// Fetch every item of the library (or collection), oldest first.
pub async fn fetch_items(settings: &Settings) -> Result<Vec<ApiItem>> {
    let url = items_url(settings)?;
    let client = Client::new();
    let t0 = Instant::now();
    info!("Fetching items from {}", url);

    let mut items = Vec::new();
    let mut start = 0usize;
    let mut pb: Option<ProgressBar> = None;

    loop {
        let page = fetch_page_with_retry(&client, settings, &url, start).await?;
        let (decoded, raw_len) = decode_items(&page.body)?;
        debug!(
            "Page at start={}: {} items ({} decoded), total={:?}",
            start,
            raw_len,
            decoded.len(),
            page.total
        );

        let bar = pb.get_or_insert_with(|| progress_bar(page.total));
        bar.inc(raw_len as u64);

        items.extend(decoded);
        start += raw_len;

        let done = raw_len < PAGE_SIZE || page.total.is_some_and(|total| start >= total);
        if done {
            break;
        }
    }

    if let Some(bar) = pb {
        bar.finish_and_clear();
    }
    info!(
        "Fetched {} items in {:.1}s",
        items.len(),
        t0.elapsed().as_secs_f64()
    );
    Ok(items)
}

/// Read a saved API response (a JSON array of items) instead of calling the API.
pub fn read_items(path: &Path) -> Result<Vec<ApiItem>> {
    let body = std::fs::read_to_string(path).map_err(|source| DashboardError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    let items = parse_items(&body)?;
    info!("Read {} items from {:?}", items.len(), path);
    Ok(items)
}

/// Decode an items response. Elements that do not look like items are skipped.
pub fn parse_items(body: &str) -> Result<Vec<ApiItem>> {
    decode_items(body).map(|(items, _)| items)
}

fn decode_items(body: &str) -> Result<(Vec<ApiItem>, usize)> {
    let values: Vec<serde_json::Value> = serde_json::from_str(body).map_err(|e| {
        DashboardError::SourceMalformed(format!("expected a JSON array of items: {}", e))
    })?;
    let raw_len = values.len();

    let items = values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<ApiItem>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping malformed item #{}: {}", i, e);
                None
            }
        })
        .collect();
    Ok((items, raw_len))
}

async fn fetch_page_with_retry(
    client: &Client,
    settings: &Settings,
    url: &str,
    start: usize,
) -> Result<Page> {
    let mut attempt = 0u32;
    loop {
        let resp = send_page(client, settings, url, start).await;

        let retry = match &resp {
            Ok(r) if r.status() == StatusCode::TOO_MANY_REQUESTS || r.status().is_server_error() => {
                Some(retry_after(r))
            }
            Err(e) if e.is_timeout() || e.is_connect() => Some(None),
            _ => None,
        };

        let Some(hint) = retry.filter(|_| attempt < MAX_RETRIES) else {
            return read_page(url, resp).await;
        };

        let backoff = hint.unwrap_or_else(|| Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt)));
        warn!(
            "Source busy at start={} (attempt {}/{}), backing off {:.1}s",
            start,
            attempt + 1,
            MAX_RETRIES,
            backoff.as_secs_f64()
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}

async fn send_page(
    client: &Client,
    settings: &Settings,
    url: &str,
    start: usize,
) -> reqwest::Result<Response> {
    let start = start.to_string();
    let limit = PAGE_SIZE.to_string();
    let mut req = client
        .get(url)
        .header("Zotero-API-Version", API_VERSION)
        .query(&[
            ("format", "json"),
            ("itemType", settings.item_types.as_str()),
            ("sort", "date"),
            ("direction", "asc"),
            ("start", start.as_str()),
            ("limit", limit.as_str()),
        ]);
    if let Some(key) = settings.api_key.as_deref() {
        req = req.header("Zotero-API-Key", key);
    }
    req.send().await
}

async fn read_page(url: &str, resp: reqwest::Result<Response>) -> Result<Page> {
    let fetch_err = |source: reqwest::Error| DashboardError::SourceFetch {
        url: url.to_string(),
        source,
    };

    let resp = resp.and_then(Response::error_for_status).map_err(fetch_err)?;
    let total = resp
        .headers()
        .get("Total-Results")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());
    let body = resp.text().await.map_err(fetch_err)?;
    Ok(Page { body, total })
}

/// Server-requested delay from `Retry-After` or `Backoff` (seconds).
fn retry_after(resp: &Response) -> Option<Duration> {
    ["Retry-After", "Backoff"].iter().find_map(|name| {
        resp.headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    })
}

fn progress_bar(total: Option<usize>) -> ProgressBar {
    let pb = match total {
        Some(n) => ProgressBar::new(n as u64),
        None => ProgressBar::new_spinner(),
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} items ({per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}
