use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::models::GroupField;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    /// Origin serving `/group_by/` and `/summarize/`, e.g. `http://localhost:8000`.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    #[serde(default)]
    pub default_group_field: GroupField,
    /// Hide groups until a search has been submitted.
    #[serde(default = "default_true")]
    pub require_search: bool,
    /// Drop responses that were overtaken by a newer request of the same kind.
    #[serde(default = "default_true")]
    pub discard_stale_responses: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_group_field: GroupField::Source,
            require_search: true,
            discard_stale_responses: true,
        }
    }
}

impl Config {
    /// Config with default view settings and the given origin.
    pub fn minimal(base_url: &str) -> Self {
        Self {
            api: ApiConfig {
                base_url: normalize_base_url(base_url),
                timeout_secs: default_timeout_secs(),
            },
            view: ViewConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            anyhow::bail!("api.base_url must not be empty");
        }
        if !(self.api.base_url.starts_with("http://") || self.api.base_url.starts_with("https://"))
        {
            anyhow::bail!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            );
        }
        if self.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be > 0");
        }
        Ok(())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    config.api.base_url = normalize_base_url(&config.api.base_url);
    config.validate()?;

    Ok(config)
}
