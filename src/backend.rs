//! Client for the news backend.
//!
//! The [`Backend`] trait is the seam between the orchestrator and the
//! network: [`HttpBackend`] talks to the real service, tests substitute
//! scripted implementations.
//!
//! # Endpoints
//!
//! | Method | Path | Query | Body |
//! |--------|------|-------|------|
//! | `GET` | `/group_by/` | `field` | `{ "<key>": [<doc id>, ...], ... }` |
//! | `GET` | `/summarize/` | `field`, `value` (both or neither) | `{ "summary": ["...", ...], "count": n }` |
//!
//! Non-2xx responses are logged with their body and surface as
//! [`FetchError::HttpStatus`]. A summary body without a `summary` field
//! decodes to an empty list.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::config::ApiConfig;
use crate::error::FetchError;
use crate::models::{GroupField, GroupingResult};

/// Restricts a summary request to one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryScope {
    pub field: GroupField,
    pub value: String,
}

impl SummaryScope {
    /// Returns `None` for an empty value, meaning an unscoped request.
    pub fn new(field: GroupField, value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        Some(Self {
            field,
            value: value.to_string(),
        })
    }
}

/// Decoded `/summarize/` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SummaryPayload {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub summary: Vec<String>,
    /// Number of documents the backend matched, when it reports one.
    #[serde(default)]
    pub count: Option<u64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn group_by(&self, field: GroupField) -> Result<GroupingResult, FetchError>;

    async fn summarize(&self, scope: Option<&SummaryScope>) -> Result<SummaryPayload, FetchError>;
}

/// [`Backend`] over HTTP using `reqwest`.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, FetchError>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        info!(url = %url, ?query, "fetching");
        let response = request.send().await?;
        let status = response.status();
        info!(url = %url, status = status.as_u16(), "response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), body = %body, "error response body");
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let value = serde_json::from_slice(&bytes).map_err(|e| {
            error!(url = %url, error = %e, "failed to parse response body");
            FetchError::Decode(e.to_string())
        })?;
        debug!(url = %url, len = bytes.len(), "response decoded");
        Ok(value)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn group_by(&self, field: GroupField) -> Result<GroupingResult, FetchError> {
        self.get_json("/group_by/", &[("field", field.as_str())])
            .await
    }

    async fn summarize(&self, scope: Option<&SummaryScope>) -> Result<SummaryPayload, FetchError> {
        match scope {
            Some(scope) => {
                self.get_json(
                    "/summarize/",
                    &[("field", scope.field.as_str()), ("value", scope.value.as_str())],
                )
                .await
            }
            None => self.get_json("/summarize/", &[]).await,
        }
    }
}
