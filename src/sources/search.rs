use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::types::SearchResponse;

/// Web search capability consumed by the dispatcher.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize, want_summary: bool) -> Result<SearchResponse>;
}

/// JSON-over-HTTP search client.
///
/// POSTs `{query, count, need_summary}` and reads back `web_items`.
pub struct HttpSearchClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpSearchClient {
    pub fn new(endpoint: &str, api_key: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building search HTTP client")?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string).filter(|k| !k.is_empty()),
            client,
        })
    }
}

#[async_trait]
impl SearchProvider for HttpSearchClient {
    async fn search(&self, query: &str, count: usize, want_summary: bool) -> Result<SearchResponse> {
        info!(query, count, "web search");
        let body = serde_json::json!({
            "query": query,
            "search_type": "web",
            "count": count,
            "need_summary": want_summary,
        });
        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req
            .send()
            .await
            .with_context(|| format!("search request to {}", self.endpoint))?
            .error_for_status()
            .context("search endpoint returned an error status")?;
        let data: SearchResponse = resp.json().await.context("parsing search response")?;
        debug!(query, items = data.items.len(), "web search complete");
        Ok(data)
    }
}
