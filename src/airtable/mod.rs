use std::env;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::models::ArticleRecord;

use cache::ResponseCache;

mod cache;

/// Hint returned to callers when the Airtable credentials are missing
pub const NOT_CONFIGURED_HINT: &str =
    "Airtable not configured. Set AIRTABLE_API_KEY and AIRTABLE_ARTICLES_TABLE.";

const DEFAULT_API_URL: &str = "https://api.airtable.com/v0";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Source of normalized article records
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch up to `limit` records, newest first. `bypass_cache` forces a
    /// fresh fetch from the backing service.
    async fn fetch_articles(
        &self,
        limit: u32,
        bypass_cache: bool,
    ) -> Result<Vec<ArticleRecord>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{}", NOT_CONFIGURED_HINT)]
    NotConfigured,
    #[error("Airtable request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Airtable returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// Airtable connection settings, resolved once at startup
#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    /// Table identifier in `{baseId}/{tableName}` form, e.g. `appXXXX/Articles`
    pub table_path: String,
    pub api_url: String,
    pub cache_ttl: Duration,
}

impl AirtableConfig {
    /// Read the Airtable settings from the environment.
    ///
    /// Returns None when either required value is missing or empty. The
    /// service still starts in that state and every fetch reports
    /// `NotConfigured`.
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty_var("AIRTABLE_API_KEY")?;
        let table_path = non_empty_var("AIRTABLE_ARTICLES_TABLE")?;
        let api_url =
            non_empty_var("AIRTABLE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let cache_ttl = env::var("AIRTABLE_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS));

        Some(Self {
            api_key,
            table_path,
            api_url,
            cache_ttl,
        })
    }

    /// Full URL of the articles table endpoint
    fn table_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_url.trim_end_matches('/'),
            self.table_path.trim_matches('/')
        )
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Client for the Airtable Articles table.
///
/// When the required settings are absent every fetch reports
/// `FetchError::NotConfigured` without touching the network.
pub struct AirtableClient {
    config: Option<AirtableConfig>,
    http: reqwest::Client,
    cache: ResponseCache,
}

impl AirtableClient {
    pub fn from_env() -> Self {
        Self::new(AirtableConfig::from_env())
    }

    pub fn new(config: Option<AirtableConfig>) -> Self {
        let ttl = config
            .as_ref()
            .map(|c| c.cache_ttl)
            .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS));

        Self {
            config,
            http: reqwest::Client::new(),
            cache: ResponseCache::new(ttl),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Fetch up to `limit` records, following Airtable offset continuation
    async fn fetch_from_airtable(
        &self,
        config: &AirtableConfig,
        limit: u32,
    ) -> Result<Vec<ArticleRecord>, FetchError> {
        let mut records = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = self.fetch_page(config, limit, offset.as_deref()).await?;
            let fetched = page.records.len();
            records.extend(page.records.into_iter().map(ArticleRecord::from));
            offset = page.offset;

            if offset.is_none() || fetched == 0 || records.len() >= limit as usize {
                break;
            }
        }

        records.truncate(limit as usize);
        Ok(records)
    }

    async fn fetch_page(
        &self,
        config: &AirtableConfig,
        limit: u32,
        offset: Option<&str>,
    ) -> Result<RecordPage, FetchError> {
        let response = self
            .http
            .get(config.table_url())
            .bearer_auth(&config.api_key)
            .query(&page_params(limit, offset))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .and_then(|body| extract_api_error(&body))
                .unwrap_or_else(|| status.to_string());
            return Err(FetchError::Api { status, message });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ArticleSource for AirtableClient {
    async fn fetch_articles(
        &self,
        limit: u32,
        bypass_cache: bool,
    ) -> Result<Vec<ArticleRecord>, FetchError> {
        let config = self.config.as_ref().ok_or(FetchError::NotConfigured)?;

        if !bypass_cache {
            if let Some(records) = self.cache.get(limit).await {
                debug!("Serving {} articles from cache", records.len());
                return Ok(records);
            }
        }

        let records = self.fetch_from_airtable(config, limit).await?;
        debug!("Fetched {} articles from Airtable", records.len());
        self.cache.put(limit, records.clone()).await;
        Ok(records)
    }
}

/// Query parameters for one page fetch
fn page_params(limit: u32, offset: Option<&str>) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("maxRecords", limit.to_string()),
        ("sort[0][field]", "Ingested At".to_string()),
        ("sort[0][direction]", "desc".to_string()),
    ];
    if let Some(offset) = offset {
        params.push(("offset", offset.to_string()));
    }
    params
}

/// Pull the human-readable message out of an Airtable error body.
///
/// The API uses both `{"error": {"message": "..."}}` and `{"error": "CODE"}`.
fn extract_api_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        serde_json::Value::String(code) => Some(code.clone()),
        serde_json::Value::Object(err) => err
            .get("message")
            .and_then(|m| m.as_str())
            .map(|m| m.to_string()),
        _ => None,
    }
}

/// One page of the Airtable list-records response
#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    records: Vec<AirtableRecord>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AirtableRecord {
    id: String,
    created_time: DateTime<Utc>,
    #[serde(default)]
    fields: RecordFields,
}

/// Table columns the endpoint consumes; anything else is ignored
#[derive(Debug, Default, Deserialize)]
struct RecordFields {
    #[serde(rename = "Headline", default)]
    headline: String,
    #[serde(rename = "Source", default)]
    source: String,
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(rename = "Ingested At")]
    ingested_at: Option<DateTime<Utc>>,
}

impl From<AirtableRecord> for ArticleRecord {
    fn from(record: AirtableRecord) -> Self {
        Self {
            id: record.id,
            headline: record.fields.headline,
            source_name: record.fields.source,
            original_url: record.fields.url,
            date_ingested: record.fields.ingested_at.unwrap_or(record.created_time),
        }
    }
}
