use serde::Deserialize;

/// One element of a Zotero Web API v3 `items` response.
///
/// Only `key` is required; everything else is optional in the wire format
/// and resolved once by `BibItem::from_api`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiItem {
    pub key: String,
    #[serde(default)]
    pub meta: ApiMeta,
    #[serde(default)]
    pub data: ApiData,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMeta {
    pub creator_summary: Option<String>,
    pub parsed_date: Option<String>, // "YYYY", "YYYY-MM" or "YYYY-MM-DD"
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiData {
    pub title: Option<String>,
    pub item_type: Option<String>,
    pub tags: Option<Vec<ApiTag>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTag {
    pub tag: String,
}
