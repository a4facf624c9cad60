use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Looked up as unref.toml / unref.yaml / ... in the working directory.
const DEFAULT_CONFIG_NAME: &str = "unref";
const ENV_PREFIX: &str = "ZOTERO";

const DEFAULT_API_BASE: &str = "https://api.zotero.org";
const DEFAULT_TAXONOMY_PATH: &str = "UnRef_tags.csv";
const DEFAULT_ITEM_TYPES: &str = "journalArticle || bookSection || book || thesis || webpage || blogPost || film || magazineArticle || document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    Group,
    User,
}

impl LibraryType {
    pub fn path_segment(self) -> &'static str {
        match self {
            LibraryType::Group => "groups",
            LibraryType::User => "users",
        }
    }
}

/// Session settings: config file first, `ZOTERO_*` environment variables on top.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub library_id: Option<String>,
    #[serde(default = "default_library_type")]
    pub library_type: LibraryType,
    pub api_key: Option<String>,
    pub collection: Option<String>,
    #[serde(default = "default_item_types")]
    pub item_types: String,
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: PathBuf,
    /// Web URL of the collection, used to link untagged items.
    pub link_base: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_library_type() -> LibraryType {
    LibraryType::Group
}

fn default_item_types() -> String {
    DEFAULT_ITEM_TYPES.to_string()
}

fn default_taxonomy_path() -> PathBuf {
    PathBuf::from(DEFAULT_TAXONOMY_PATH)
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        let config = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read configuration")?;
        config
            .try_deserialize()
            .context("Invalid dashboard configuration")
    }

    #[cfg(test)]
    fn from_toml(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn item_link(&self, key: &str) -> Option<String> {
        self.link_base
            .as_deref()
            .map(|base| format!("{}/items/{}/collection", base.trim_end_matches('/'), key))
    }
}
