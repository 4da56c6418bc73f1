use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::airtable::{FetchError, NOT_CONFIGURED_HINT};
use crate::models::ArticlesResponse;
use crate::AppState;

const DEFAULT_LIMIT: u32 = 50;

pub fn routes() -> axum::Router<AppState> {
    axum::Router::new().route("/articles", axum::routing::get(list_articles))
}

/// Raw query parameters for the articles listing.
///
/// `limit` stays a string so an unparsable value falls back to the default
/// instead of rejecting the request with a 400.
#[derive(Debug, Deserialize)]
struct ArticlesQuery {
    limit: Option<String>,
    refresh: Option<String>,
}

/// GET /api/articles
/// List ingested articles, newest first
async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ArticlesQuery>,
) -> impl IntoResponse {
    let limit = parse_limit(query.limit.as_deref());
    let bypass_cache = matches!(query.refresh.as_deref(), Some("true"));

    match state.articles.fetch_articles(limit, bypass_cache).await {
        Ok(articles) => Ok(Json(ArticlesResponse {
            articles,
            message: None,
        })),
        // Missing configuration maps to an empty 200, not a 500
        Err(FetchError::NotConfigured) => {
            tracing::warn!("Articles requested but Airtable is not configured");
            Ok(Json(ArticlesResponse {
                articles: Vec::new(),
                message: Some(NOT_CONFIGURED_HINT.to_string()),
            }))
        }
        Err(e) => {
            tracing::error!("Failed to fetch articles: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to fetch articles",
                    "details": e.to_string()
                })),
            ))
        }
    }
}

fn parse_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_LIMIT)
}
