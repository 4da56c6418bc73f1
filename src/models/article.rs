use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized article metadata served by the articles endpoint.
///
/// Field names on the wire are camelCase to match what the frontend consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: String,
    pub headline: String,
    pub source_name: String,
    pub original_url: String,
    pub date_ingested: DateTime<Utc>,
}

/// Response for the articles listing endpoint
///
/// `message` is only present for the not-configured soft failure.
#[derive(Debug, Serialize)]
pub struct ArticlesResponse {
    pub articles: Vec<ArticleRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
